use ndarray::{stack, Array1, ArrayD, ArrayView, Axis, IxDyn};
use tracing::debug;

use super::{check_bounds_count, AnyVariable, DimBounds, DimensionInfo, Variable, VariableError};
use crate::{common::array::staggered, slice::Slice};

/// The same variable taken from several stores, stacked along a new leading dimension.
#[derive(Debug, Clone)]
pub struct MergedVariable {
    variables: Vec<AnyVariable>,
    merge_dimension: String,
    merge_label: String,
}

impl MergedVariable {
    pub fn new(
        variables: Vec<AnyVariable>,
        merge_dimension: impl Into<String>,
        merge_label: impl Into<String>,
    ) -> Self {
        Self {
            variables,
            merge_dimension: merge_dimension.into(),
            merge_label: merge_label.into(),
        }
    }

    pub fn merge_dimension(&self) -> &str {
        &self.merge_dimension
    }

    pub fn variables(&self) -> &[AnyVariable] {
        &self.variables
    }
}

/// Store indices selected by `bounds`: the lower bound is rounded down and
/// the upper one up, both are clamped to `[0, count - 1]`.
pub(crate) fn merge_window(bounds: DimBounds, count: usize) -> Option<(usize, usize)> {
    if count == 0 {
        return None;
    }
    let last = (count - 1) as f64;
    let first_index = bounds.min.map_or(0.0, |min| min.floor().max(0.0));
    let last_index = bounds.max.map_or(last, |max| max.ceil().min(last));
    // NaN bounds fail this comparison too
    if first_index <= last_index {
        Some((first_index as usize, last_index as usize))
    } else {
        None
    }
}

/// Repeats `arr` `count` times along a new leading axis.
fn repeat_leading(arr: &ArrayD<f64>, count: usize) -> Result<ArrayD<f64>, VariableError> {
    let views: Vec<ArrayView<f64, IxDyn>> = (0..count).map(|_| arr.view()).collect();
    Ok(stack(Axis(0), &views)?)
}

fn stack_parts<'a>(
    parts: impl Iterator<Item = Option<&'a ArrayD<f64>>>,
) -> Result<Option<ArrayD<f64>>, VariableError> {
    let views: Option<Vec<_>> = parts.map(|p| p.map(|a| a.view())).collect();
    match views {
        Some(views) => Ok(Some(stack(Axis(0), &views)?)),
        None => Ok(None),
    }
}

impl Variable for MergedVariable {
    fn name(&self) -> &str {
        self.variables.first().map_or("", |v| v.name())
    }

    fn long_name(&self) -> &str {
        self.variables.first().map_or("", |v| v.long_name())
    }

    fn unit(&self) -> &str {
        self.variables.first().map_or("", |v| v.unit())
    }

    fn dimensions(&self) -> Vec<String> {
        let mut dimensions = vec![self.merge_dimension.clone()];
        if let Some(first) = self.variables.first() {
            dimensions.extend(first.dimensions());
        }
        dimensions
    }

    fn slice(&self, bounds: &[DimBounds]) -> Result<Slice, VariableError> {
        let mut slice = Slice::new(self.dimensions());
        check_bounds_count(self.name(), bounds, slice.ndim())?;

        let Some((first, last)) = merge_window(bounds[0], self.variables.len()) else {
            debug!(variable = self.name(), "Merge bounds select no store");
            return Ok(slice);
        };

        let mut parts = Vec::with_capacity(last - first + 1);
        for variable in &self.variables[first..=last] {
            let part = variable.slice(&bounds[1..])?;
            if !part.is_valid() {
                debug!(variable = self.name(), "Merged part has no data");
                return Ok(slice);
            }
            parts.push(part);
        }

        let count = parts.len();
        let merge_coords = Array1::from_iter((first..=last).map(|i| i as f64));
        slice.coords_stag[0] = Some(staggered(merge_coords.view()).into_dyn());
        slice.coords[0] = Some(merge_coords.into_dyn());

        slice.data = stack_parts(parts.iter().map(|p| p.data.as_ref()))?;
        slice.lbound = stack_parts(parts.iter().map(|p| p.lbound.as_ref()))?;
        slice.ubound = stack_parts(parts.iter().map(|p| p.ubound.as_ref()))?;

        let template = &parts[0];
        for (idim, (coords, coords_stag)) in template
            .coords
            .iter()
            .zip(&template.coords_stag)
            .enumerate()
        {
            let lift = |c: &Option<ArrayD<f64>>| -> Result<Option<ArrayD<f64>>, VariableError> {
                match c {
                    Some(c) if c.ndim() > 1 => Ok(Some(repeat_leading(c, count)?)),
                    other => Ok(other.clone()),
                }
            };
            slice.coords[idim + 1] = lift(coords)?;
            slice.coords_stag[idim + 1] = lift(coords_stag)?;
        }
        slice.fixedcoords = template.fixedcoords.clone();
        Ok(slice)
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        if dimension == self.merge_dimension {
            DimensionInfo::new(dimension)
                .with_label(self.merge_label.clone())
                .with_datatype(super::DataType::Integer)
        } else {
            self.variables
                .first()
                .map_or_else(|| DimensionInfo::new(dimension), |v| v.dimension_info(dimension))
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::variable::{test_util, SourceVariable};

    fn runs(count: usize) -> MergedVariable {
        let variables = (0..count)
            .map(|run| {
                let offset = run as f64 * 100.0;
                SourceVariable::builder(
                    "temp",
                    ["time"],
                    array![10.0 + offset, 12.0 + offset, 14.0 + offset].into_dyn(),
                )
                .coords("time", array![0.0, 1.0, 2.0].into_dyn())
                .build()
                .unwrap()
                .into()
            })
            .collect();
        MergedVariable::new(variables, "run", "observation")
    }

    #[test]
    fn stacks_in_store_order() {
        let merged = runs(2);
        assert_eq!(merged.dimensions(), vec!["run".to_string(), "time".to_string()]);
        let slice = merged
            .slice(&[DimBounds::new(Some(0.0), Some(1.0)), DimBounds::unbounded()])
            .unwrap();
        assert!(slice.is_valid());
        assert_eq!(
            slice.data,
            Some(array![[10.0, 12.0, 14.0], [110.0, 112.0, 114.0]].into_dyn())
        );
        assert_eq!(slice.coords[0], Some(array![0.0, 1.0].into_dyn()));
        assert_eq!(slice.coords_stag[0], Some(array![-0.5, 0.5, 1.5].into_dyn()));
        assert_eq!(slice.coords[1], Some(array![0.0, 1.0, 2.0].into_dyn()));
    }

    #[test]
    fn bounds_clamp_and_round_outward() {
        assert_eq!(merge_window(DimBounds::new(Some(-3.0), Some(7.0)), 3), Some((0, 2)));
        assert_eq!(merge_window(DimBounds::new(Some(0.4), Some(0.6)), 3), Some((0, 1)));
        assert_eq!(merge_window(DimBounds::unbounded(), 4), Some((0, 3)));
        assert_eq!(merge_window(DimBounds::new(Some(5.0), None), 3), None);
        assert_eq!(merge_window(DimBounds::unbounded(), 0), None);

        let slice = runs(3)
            .slice(&[DimBounds::new(Some(1.5), Some(10.0)), DimBounds::unbounded()])
            .unwrap();
        assert_eq!(slice.coords[0], Some(array![1.0, 2.0].into_dyn()));
        assert_eq!(slice.shape(), &[2, 3]);
    }

    #[test]
    fn out_of_range_is_invalid() {
        let slice = runs(2)
            .slice(&[DimBounds::new(Some(4.0), Some(5.0)), DimBounds::unbounded()])
            .unwrap();
        assert!(!slice.is_valid());
    }

    #[test]
    fn merge_dimension_info() {
        let merged = MergedVariable::new(vec![test_util::temp()], "obs", "observation");
        assert_eq!(merged.dimension_info("obs").label, "observation");
        assert_eq!(merged.dimension_info("time").label, "time");
        assert_eq!(merged.name(), "temp");
        assert_eq!(merged.unit(), "degC");
    }
}
