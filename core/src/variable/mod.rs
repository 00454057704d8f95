use derive_more::Constructor;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::slice::Slice;

mod average;
mod err;
mod flat;
mod merged;
mod reduce;
mod slice;
mod source;

pub use average::{BoundsMeasure, CenterMeasure, VariableAverage};
pub use err::VariableError;
pub use flat::VariableFlat;
pub use merged::MergedVariable;
pub use reduce::ReduceDimension;
pub use slice::VariableSlice;
pub use source::{SourceVariable, SourceVariableBuilder};

/// Something that can be plotted: named n-dimensional data that hands out
/// [`Slice`]s on request.
#[enum_dispatch]
pub trait Variable {
    /// Short name, unique within the owning store.
    fn name(&self) -> &str;
    fn long_name(&self) -> &str;
    fn unit(&self) -> &str;
    fn dimensions(&self) -> Vec<String>;

    /// Fetches data with one bound pair per dimension.
    ///
    /// Bounds are a hint: implementations may return data outside of them.
    /// An invalid slice (see [`Slice::is_valid`]) means there is no data.
    fn slice(&self, bounds: &[DimBounds]) -> Result<Slice, VariableError>;

    fn dimension_info(&self, dimension: &str) -> DimensionInfo;
}

#[enum_dispatch(Variable)]
#[derive(Debug, Clone)]
pub enum AnyVariable {
    SourceVariable,
    MergedVariable,
    VariableSlice,
    VariableAverage,
    VariableFlat,
}

/// Requested range along one dimension. `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Constructor, Serialize, Deserialize)]
pub struct DimBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DimBounds {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn at(value: f64) -> Self {
        Self::new(Some(value), Some(value))
    }

    /// Both ends set and equal.
    pub fn degenerate_value(&self) -> Option<f64> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => Some(min),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Float,
    Integer,
    /// Values are day numbers, see `varplot_figure::time`.
    Datetime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub label: String,
    pub unit: String,
    pub preferred_axis: Option<PreferredAxis>,
    pub datatype: DataType,
}

impl DimensionInfo {
    /// Plain float dimension labelled by its id.
    pub fn new(dimension: &str) -> Self {
        Self {
            label: dimension.to_string(),
            unit: String::new(),
            preferred_axis: None,
            datatype: DataType::Float,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_preferred_axis(mut self, axis: PreferredAxis) -> Self {
        self.preferred_axis = Some(axis);
        self
    }

    pub fn with_datatype(mut self, datatype: DataType) -> Self {
        self.datatype = datatype;
        self
    }
}

pub(crate) fn check_bounds_count(
    variable: &str,
    bounds: &[DimBounds],
    expected: usize,
) -> Result<(), VariableError> {
    if bounds.len() == expected {
        Ok(())
    } else {
        Err(VariableError::WrongBoundsCount {
            variable: variable.to_string(),
            found: bounds.len(),
            expected,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use ndarray::{array, Array2};

    use super::*;

    /// `temp` over `time`: values 10, 12, 14 at times 0, 1, 2.
    pub fn temp() -> AnyVariable {
        SourceVariable::builder("temp", ["time"], array![10.0, 12.0, 14.0].into_dyn())
            .long_name("temperature")
            .unit("degC")
            .coords("time", array![0.0, 1.0, 2.0].into_dyn())
            .build()
            .unwrap()
            .into()
    }

    /// `field` over `(x, z)` with value `10 * x + z`.
    pub fn field(nx: usize, nz: usize) -> AnyVariable {
        let data = Array2::from_shape_fn((nx, nz), |(x, z)| 10.0 * x as f64 + z as f64);
        SourceVariable::builder("field", ["x", "z"], data.into_dyn())
            .coords("x", ndarray::Array1::from_iter((0..nx).map(|x| x as f64)).into_dyn())
            .coords("z", ndarray::Array1::from_iter((0..nz).map(|z| z as f64 * 0.5)).into_dyn())
            .build()
            .unwrap()
            .into()
    }
}
