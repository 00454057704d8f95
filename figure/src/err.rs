use thiserror::Error;
use varplot_core::{common::code::UnknownCode, variable::VariableError};

use crate::backend::BackendError;

/// Configuration errors that abort a figure update.
#[derive(Error, Debug)]
pub enum FigureError {
    #[error("No source given for variable {variable} and no default source is registered")]
    NoDefaultSource { variable: String },
    #[error("Unknown data source {0}")]
    UnknownSource(String),
    #[error("Source {store} does not contain a variable named {variable}")]
    MissingVariable { store: String, variable: String },
    #[error("Series id {0:?} is not of the form source/variable")]
    MalformedSeriesId(String),
    #[error("Only one color-mapped series per figure is supported (second one: {0})")]
    MultipleColorbars(String),
    #[error("The colorbar cannot show a time axis")]
    TimeColorbar,
    #[error("A colorbar axis was configured but no colorbar was drawn")]
    MissingColorbar,
    #[error(transparent)]
    Variable(#[from] VariableError),
    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
