use std::{collections::HashMap, sync::Arc};

use super::{StoreError, VariableStore};
use crate::variable::{AnyVariable, DimensionInfo, SourceVariable, Variable};

/// A single backing store holding in-memory variables and the description
/// of their dimensions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    variables: Vec<SourceVariable>,
    dimensions: Arc<HashMap<String, DimensionInfo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, variable: SourceVariable) -> Result<(), StoreError> {
        if self.variables.iter().any(|v| v.name() == variable.name()) {
            return Err(StoreError::DuplicateVariable(variable.name().to_string()));
        }
        self.variables.push(variable);
        Ok(())
    }

    pub fn set_dimension_info(&mut self, dimension: impl Into<String>, info: DimensionInfo) {
        Arc::make_mut(&mut self.dimensions).insert(dimension.into(), info);
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl VariableStore for MemoryStore {
    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name().to_string()).collect()
    }

    fn variable_long_names(&self) -> Vec<(String, String)> {
        self.variables
            .iter()
            .map(|v| (v.name().to_string(), v.long_name().to_string()))
            .collect()
    }

    fn variable(&self, name: &str) -> Option<AnyVariable> {
        self.variables
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.clone().with_dimension_table(self.dimensions.clone()).into())
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.dimensions
            .get(dimension)
            .cloned()
            .unwrap_or_else(|| DimensionInfo::new(dimension))
    }
}
