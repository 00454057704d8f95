use thiserror::Error;

use crate::common::code::UnknownCode;

#[derive(Error, Debug)]
pub enum VariableError {
    #[error("Dimension {dimension} not found in variable {variable}")]
    DimensionNotFound { variable: String, dimension: String },
    #[error("Wrong number of bounds for {variable} ({found} given, expected {expected})")]
    WrongBoundsCount {
        variable: String,
        found: usize,
        expected: usize,
    },
    #[error("Coordinates of dimension {0} depend on other dimensions, only 1-D coordinates are supported here")]
    MultiDimensionalCoordinates(String),
    #[error("Coordinates of dimension {0} have not been set")]
    MissingCoordinates(String),
    #[error("Coordinates of dimension {dimension} have shape {found:?}, expected {expected:?}")]
    CoordinateShape {
        dimension: String,
        found: Vec<usize>,
        expected: Vec<usize>,
    },
    #[error("Variable {variable} has {dimensions} dimensions but {data_ndim}-D data")]
    DimensionCount {
        variable: String,
        dimensions: usize,
        data_ndim: usize,
    },
    #[error("Cannot flatten dimension {0} into itself")]
    FlattenIntoSelf(String),
    #[error("Percentile width {0} is outside [0, 1]")]
    PercentileWidth(f64),
    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
