use super::{StoreError, VariableStore};
use crate::variable::{AnyVariable, DimensionInfo, Variable};

/// An ad-hoc selection of variables taken from other stores or built from
/// transforms. Names must be unique.
#[derive(Debug, Clone, Default)]
pub struct CustomVariableStore {
    variables: Vec<AnyVariable>,
}

impl CustomVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, variable: impl Into<AnyVariable>) -> Result<(), StoreError> {
        let variable = variable.into();
        if self.variables.iter().any(|v| v.name() == variable.name()) {
            return Err(StoreError::DuplicateVariable(variable.name().to_string()));
        }
        self.variables.push(variable);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl VariableStore for CustomVariableStore {
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
        self.variables.iter().find(|v| v.name() == name).cloned()
    }

    /// Described by the first variable using the dimension.
    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        self.variables
            .iter()
            .find(|v| v.dimensions().iter().any(|d| d == dimension))
            .map_or_else(|| DimensionInfo::new(dimension), |v| v.dimension_info(dimension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{test_util, VariableAverage};

    #[test]
    fn collects_transforms() {
        let mut store = CustomVariableStore::new();
        store.add_variable(test_util::temp()).unwrap();
        store
            .add_variable(VariableAverage::new(test_util::field(2, 2), "x").unwrap())
            .unwrap();

        assert_eq!(store.variable_names(), vec!["temp", "avg_field"]);
        assert_eq!(store.variable("avg_field").unwrap().dimensions(), vec!["z".to_string()]);
        assert!(store.variable("field").is_none());
        assert_eq!(store.dimension_info("z").label, "z");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut store = CustomVariableStore::new();
        store.add_variable(test_util::temp()).unwrap();
        assert!(matches!(
            store.add_variable(test_util::temp()),
            Err(StoreError::DuplicateVariable(name)) if name == "temp"
        ));
        assert_eq!(store.len(), 1);
    }
}
