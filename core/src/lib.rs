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

//! Labelled n-dimensional variables, their transforms and the stores holding them.

pub mod common;
pub mod slice;
pub mod store;
pub mod tree;
pub mod variable;

pub use slice::Slice;
pub use store::{AnyStore, VariableStore};
pub use variable::{AnyVariable, DimBounds, Variable};
