use std::{collections::HashMap, ops::Range, sync::Arc};

use ndarray::{Array1, ArrayD, ArrayView1, Axis, Ix1};

use super::{check_bounds_count, DimBounds, DimensionInfo, Variable, VariableError};
use crate::{
    common::array::{is_ascending, search_sorted_left, staggered},
    slice::Slice,
};

#[derive(Debug)]
struct SourceData {
    name: String,
    long_name: String,
    unit: String,
    dimensions: Vec<String>,
    data: ArrayD<f64>,
    coords: Vec<ArrayD<f64>>,
    coords_stag: Vec<ArrayD<f64>>,
}

/// A variable backed by an in-memory array. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct SourceVariable {
    inner: Arc<SourceData>,
    dimension_table: Arc<HashMap<String, DimensionInfo>>,
}

impl SourceVariable {
    pub fn builder<D: Into<String>>(
        name: impl Into<String>,
        dimensions: impl IntoIterator<Item = D>,
        data: ArrayD<f64>,
    ) -> SourceVariableBuilder {
        let name = name.into();
        SourceVariableBuilder {
            long_name: name.clone(),
            name,
            unit: String::new(),
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            data,
            coords: HashMap::new(),
            coords_stag: HashMap::new(),
        }
    }

    /// Uses `table` to describe dimensions from now on.
    pub(crate) fn with_dimension_table(
        mut self,
        table: Arc<HashMap<String, DimensionInfo>>,
    ) -> Self {
        self.dimension_table = table;
        self
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.inner.data
    }

    /// Index windows per dimension. Only 1-D ascending coordinates allow
    /// trimming; otherwise everything is returned.
    fn windows(&self, bounds: &[DimBounds]) -> Vec<Range<usize>> {
        let full: Vec<_> = self.inner.data.shape().iter().map(|&n| 0..n).collect();
        let axes: Option<Vec<ArrayView1<f64>>> = self
            .inner
            .coords
            .iter()
            .map(|c| c.view().into_dimensionality::<Ix1>().ok())
            .collect();
        match axes {
            Some(axes) if axes.iter().all(|c| is_ascending(c.view())) => axes
                .iter()
                .zip(bounds)
                .map(|(c, b)| window(c.view(), *b))
                .collect(),
            _ => full,
        }
    }
}

/// Indices covering `bounds`, plus one neighbour on either side.
fn window(coords: ArrayView1<f64>, bounds: DimBounds) -> Range<usize> {
    let n = coords.len();
    let start = bounds
        .min
        .map_or(0, |min| search_sorted_left(coords, min).saturating_sub(1));
    let end = bounds.max.map_or(n, |max| {
        let above = coords.iter().position(|&c| c > max).unwrap_or(n);
        (above + 1).min(n)
    });
    start..end.max(start)
}

impl Variable for SourceVariable {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn long_name(&self) -> &str {
        &self.inner.long_name
    }

    fn unit(&self) -> &str {
        &self.inner.unit
    }

    fn dimensions(&self) -> Vec<String> {
        self.inner.dimensions.clone()
    }

    fn slice(&self, bounds: &[DimBounds]) -> Result<Slice, VariableError> {
        check_bounds_count(&self.inner.name, bounds, self.inner.dimensions.len())?;
        let windows = self.windows(bounds);

        let mut data = self.inner.data.view();
        for (idim, range) in windows.iter().enumerate() {
            data.slice_axis_inplace(Axis(idim), range.clone().into());
        }

        let mut slice = Slice::new(self.dimensions());
        slice.data = Some(data.to_owned());
        for (idim, range) in windows.iter().enumerate() {
            let coords = &self.inner.coords[idim];
            let coords_stag = &self.inner.coords_stag[idim];
            if coords.ndim() == 1 {
                let stag_range = range.start..(range.end + 1).min(coords_stag.len());
                slice.coords[idim] = Some(coords.slice_axis(Axis(0), range.clone().into()).to_owned());
                slice.coords_stag[idim] =
                    Some(coords_stag.slice_axis(Axis(0), stag_range.into()).to_owned());
            } else {
                slice.coords[idim] = Some(coords.clone());
                slice.coords_stag[idim] = Some(coords_stag.clone());
            }
        }
        Ok(slice)
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.dimension_table
            .get(dimension)
            .cloned()
            .unwrap_or_else(|| DimensionInfo::new(dimension))
    }
}

pub struct SourceVariableBuilder {
    name: String,
    long_name: String,
    unit: String,
    dimensions: Vec<String>,
    data: ArrayD<f64>,
    coords: HashMap<String, ArrayD<f64>>,
    coords_stag: HashMap<String, ArrayD<f64>>,
}

impl SourceVariableBuilder {
    pub fn long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Center coordinates: 1-D along the dimension, or shaped like the data.
    /// Dimensions without coordinates use their indices.
    pub fn coords(mut self, dimension: impl Into<String>, coords: ArrayD<f64>) -> Self {
        self.coords.insert(dimension.into(), coords);
        self
    }

    /// Interface coordinates. Derived from 1-D center coordinates when not given.
    pub fn coords_stag(mut self, dimension: impl Into<String>, coords: ArrayD<f64>) -> Self {
        self.coords_stag.insert(dimension.into(), coords);
        self
    }

    pub fn build(mut self) -> Result<SourceVariable, VariableError> {
        if self.dimensions.len() != self.data.ndim() {
            return Err(VariableError::DimensionCount {
                variable: self.name,
                dimensions: self.dimensions.len(),
                data_ndim: self.data.ndim(),
            });
        }
        if let Some(dimension) = self
            .coords
            .keys()
            .chain(self.coords_stag.keys())
            .find(|d| !self.dimensions.contains(*d))
        {
            return Err(VariableError::DimensionNotFound {
                variable: self.name.clone(),
                dimension: dimension.clone(),
            });
        }

        let shape = self.data.shape().to_vec();
        let mut coords = Vec::with_capacity(shape.len());
        let mut coords_stag = Vec::with_capacity(shape.len());
        for (idim, dimension) in self.dimensions.iter().enumerate() {
            let center = match self.coords.remove(dimension) {
                Some(center) => center,
                None => Array1::from_iter((0..shape[idim]).map(|i| i as f64)).into_dyn(),
            };
            check_coordinate_shape(dimension, &center, &shape, idim, 0)?;

            let stag = match self.coords_stag.remove(dimension) {
                Some(stag) => stag,
                None => {
                    let center = center
                        .view()
                        .into_dimensionality::<Ix1>()
                        .map_err(|_| VariableError::MultiDimensionalCoordinates(dimension.clone()))?;
                    staggered(center).into_dyn()
                }
            };
            check_coordinate_shape(dimension, &stag, &shape, idim, 1)?;

            coords.push(center);
            coords_stag.push(stag);
        }

        Ok(SourceVariable {
            inner: Arc::new(SourceData {
                name: self.name,
                long_name: self.long_name,
                unit: self.unit,
                dimensions: self.dimensions,
                data: self.data,
                coords,
                coords_stag,
            }),
            dimension_table: Arc::default(),
        })
    }
}

/// 1-D coordinates must match the dimension length, n-D ones the data shape.
/// `extra` is 1 for interface coordinates.
fn check_coordinate_shape(
    dimension: &str,
    coords: &ArrayD<f64>,
    shape: &[usize],
    idim: usize,
    extra: usize,
) -> Result<(), VariableError> {
    let expected = if coords.ndim() == 1 {
        // empty dimensions have no interfaces either
        vec![if shape[idim] == 0 { 0 } else { shape[idim] + extra }]
    } else {
        let mut expected = shape.to_vec();
        expected[idim] += extra;
        expected
    };
    if coords.shape() == expected.as_slice() {
        Ok(())
    } else {
        Err(VariableError::CoordinateShape {
            dimension: dimension.to_string(),
            found: coords.shape().to_vec(),
            expected,
        })
    }
}
