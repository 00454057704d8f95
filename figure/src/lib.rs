#![warn(clippy::complexity)]
#![warn(clippy::correctness)]
#![warn(clippy::perf)]
#![warn(clippy::style)]
#![warn(clippy::suspicious)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
// #![warn(clippy::pedantic)]

//! Figures built from variable stores: typed forced/default properties,
//! axis inference and the drawing-surface contract.

pub mod backend;
pub mod err;
pub mod figure;
pub mod properties;
pub mod style;
pub mod time;

pub use backend::{PlotBackend, RecordingBackend, Scene};
pub use err::FigureError;
pub use figure::{Figure, FigureEvent};
pub use properties::FigureProperties;
