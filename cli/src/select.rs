//! Transforms requested on the command line, applied to every selected variable.

use varplot_core::{
    variable::{CenterMeasure, VariableAverage, VariableError, VariableFlat, VariableSlice},
    AnyVariable,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transforms {
    /// Applied first, in order.
    pub slices: Vec<(String, f64)>,
    /// `(dimension, target)`
    pub flatten: Option<(String, String)>,
    pub average: Option<String>,
    pub median: bool,
}

impl Transforms {
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty() && self.flatten.is_none() && self.average.is_none()
    }

    /// Slices, then flattens, then averages `variable`.
    pub fn apply(&self, mut variable: AnyVariable) -> Result<AnyVariable, VariableError> {
        for (dimension, value) in &self.slices {
            variable = VariableSlice::new(variable, dimension, *value)?.into();
        }
        if let Some((dimension, target)) = &self.flatten {
            variable = VariableFlat::new(variable, dimension, target)?.into();
        }
        if let Some(dimension) = &self.average {
            let center = if self.median {
                CenterMeasure::Median
            } else {
                CenterMeasure::Mean
            };
            variable = VariableAverage::new(variable, dimension)?
                .with_center_measure(center)
                .into();
        }
        Ok(variable)
    }
}

/// `DIM=VALUE`
pub fn parse_slice(arg: &str) -> Result<(String, f64), String> {
    let (dimension, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected DIM=VALUE, got '{arg}'"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid coordinate '{value}': {e}"))?;
    Ok((dimension.trim().to_string(), value))
}

/// `DIM:TARGET`
pub fn parse_flatten(arg: &str) -> Result<(String, String), String> {
    match arg.split_once(':') {
        Some((dimension, target)) if !dimension.is_empty() && !target.is_empty() => {
            Ok((dimension.to_string(), target.to_string()))
        }
        _ => Err(format!("expected DIM:TARGET, got '{arg}'")),
    }
}

/// Splits `source/name`; a bare name has no source.
pub fn split_variable(arg: &str) -> (Option<&str>, &str) {
    match arg.split_once('/') {
        Some((source, name)) => (Some(source), name),
        None => (None, arg),
    }
}
