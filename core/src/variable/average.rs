use ndarray::{ArrayD, Axis, ErrorKind, Ix1, ShapeError};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{
    reduce::impl_name_overrides, AnyVariable, DimBounds, DimensionInfo, ReduceDimension, Variable,
    VariableError,
};
use crate::{
    coded_enum,
    common::array::{broadcast_along, diff, weighted_percentiles},
    slice::Slice,
};

coded_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CenterMeasure: "center measure" {
        #[default]
        Mean = 0,
        Median = 1,
    }
}

coded_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BoundsMeasure: "bounds measure" {
        #[default]
        StdDev = 0,
        Percentile = 1,
    }
}

/// Weighted average (or median) over one dimension, with a confidence
/// envelope from the standard deviation or from percentiles.
///
/// Each point is weighted by the width of its cell along the averaged dimension.
#[derive(Debug, Clone)]
pub struct VariableAverage {
    reduce: ReduceDimension,
    center: CenterMeasure,
    bounds: BoundsMeasure,
    percentile_width: f64,
}

impl VariableAverage {
    pub fn new(source: AnyVariable, dimension: &str) -> Result<Self, VariableError> {
        let label = source.dimension_info(dimension).label;
        Ok(Self {
            reduce: ReduceDimension::new(source, dimension, "avg_", &format!("{label}-averaged "))?,
            center: CenterMeasure::Mean,
            bounds: BoundsMeasure::StdDev,
            percentile_width: 0.5,
        })
    }

    /// Measures given by their integer codes.
    pub fn from_codes(
        source: AnyVariable,
        dimension: &str,
        center: u8,
        bounds: u8,
        percentile_width: f64,
    ) -> Result<Self, VariableError> {
        Self::new(source, dimension)?
            .with_center_measure(CenterMeasure::try_from(center)?)
            .with_bounds_measure(BoundsMeasure::try_from(bounds)?)
            .with_percentile_width(percentile_width)
    }

    pub fn with_center_measure(mut self, center: CenterMeasure) -> Self {
        self.center = center;
        self
    }

    pub fn with_bounds_measure(mut self, bounds: BoundsMeasure) -> Self {
        self.bounds = bounds;
        self
    }

    /// Fraction of the distribution between the percentile bounds, e.g. 0.5
    /// for the inter-quartile range.
    pub fn with_percentile_width(mut self, width: f64) -> Result<Self, VariableError> {
        if !(0.0..=1.0).contains(&width) {
            return Err(VariableError::PercentileWidth(width));
        }
        self.percentile_width = width;
        Ok(self)
    }

    /// Cell widths along the averaged axis, normalized to sum to one.
    fn weights(&self, source: &Slice, data: &ArrayD<f64>) -> Result<ArrayD<f64>, VariableError> {
        let idim = self.reduce.idimension;
        let axis = Axis(idim);
        let stag = source.coords_stag[idim]
            .as_ref()
            .ok_or_else(|| VariableError::MissingCoordinates(self.reduce.dimension.clone()))?;
        let widths = if stag.ndim() == 1 {
            let widths = diff(stag.view(), Axis(0)).into_dimensionality::<Ix1>()?;
            broadcast_along(widths.view(), data.shape(), idim)?
        } else {
            diff(stag.view(), axis)
        };
        let total = widths.sum_axis(axis).insert_axis(axis);
        let total = total
            .broadcast(widths.raw_dim())
            .ok_or_else(|| ShapeError::from_kind(ErrorKind::IncompatibleShape))?;
        Ok(&widths / &total)
    }
}

impl_name_overrides!(VariableAverage);

impl Variable for VariableAverage {
    fn name(&self) -> &str {
        &self.reduce.name
    }

    fn long_name(&self) -> &str {
        &self.reduce.long_name
    }

    fn unit(&self) -> &str {
        self.reduce.source.unit()
    }

    fn dimensions(&self) -> Vec<String> {
        self.reduce.dimensions()
    }

    #[instrument(level = "debug", skip_all, fields(variable = %self.reduce.name))]
    fn slice(&self, bounds: &[DimBounds]) -> Result<Slice, VariableError> {
        let reduce = &self.reduce;
        let source_bounds = reduce.source_bounds(bounds, DimBounds::unbounded())?;
        let source = reduce.source.slice(&source_bounds)?;

        let mut slice = Slice::new(self.dimensions());
        let Some(data) = source.data.as_ref().filter(|_| source.is_valid()) else {
            return Ok(slice);
        };

        let idim = reduce.idimension;
        let axis = Axis(idim);
        let first_along = |c: &ArrayD<f64>| {
            if c.ndim() == 1 {
                c.clone()
            } else {
                c.index_axis(axis, 0).to_owned()
            }
        };
        for (isource, (coords, coords_stag)) in
            source.coords.iter().zip(&source.coords_stag).enumerate()
        {
            if let Some(itarget) = reduce.reduced_index(isource) {
                slice.coords[itarget] = coords.as_ref().map(first_along);
                slice.coords_stag[itarget] = coords_stag.as_ref().map(first_along);
            }
        }

        let weights = self.weights(&source, data)?;

        let mean = (self.center == CenterMeasure::Mean || self.bounds == BoundsMeasure::StdDev)
            .then(|| (data * &weights).sum_axis(axis));

        let low = (1.0 - self.percentile_width) / 2.0;
        let mut fractions = Vec::new();
        if self.center == CenterMeasure::Median {
            fractions.push(0.5);
        }
        if self.bounds == BoundsMeasure::Percentile {
            fractions.extend([low, 1.0 - low]);
        }
        let mut percentiles = if fractions.is_empty() {
            Vec::new()
        } else {
            weighted_percentiles(data.view(), weights.view(), axis, &fractions)
        }
        .into_iter();

        let center = match (self.center, &mean) {
            (CenterMeasure::Mean, Some(mean)) => mean.clone(),
            _ => percentiles.next().unwrap_or_default(),
        };

        match (self.bounds, &mean) {
            (BoundsMeasure::StdDev, Some(mean)) => {
                let mean_sq = (&data.mapv(|v| v * v) * &weights).sum_axis(axis);
                let sd = (&mean_sq - &mean.mapv(|m| m * m)).mapv(|v| v.max(0.0).sqrt());
                slice.lbound = Some(&center - &sd);
                slice.ubound = Some(&center + &sd);
            }
            _ => {
                slice.lbound = percentiles.next();
                slice.ubound = percentiles.next();
            }
        }
        slice.data = Some(center);
        slice.fixedcoords = source.fixedcoords.clone();
        Ok(slice)
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.reduce.dimension_info(dimension)
    }
}
