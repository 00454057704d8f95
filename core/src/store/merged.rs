use tracing::warn;

use super::{AnyStore, VariableStore};
use crate::variable::{AnyVariable, DataType, DimensionInfo, MergedVariable};

/// Stores sharing one variable schema, stacked along a new merge dimension
/// whose coordinate is the store index.
#[derive(Debug, Clone)]
pub struct MergedVariableStore {
    stores: Vec<AnyStore>,
    merge_dimension: String,
    merge_label: String,
}

impl MergedVariableStore {
    /// Merge dimension `obs`, labelled `observation`.
    pub fn new(stores: Vec<AnyStore>) -> Self {
        Self::with_dimension(stores, "obs", "observation")
    }

    pub fn with_dimension(
        stores: Vec<AnyStore>,
        merge_dimension: impl Into<String>,
        merge_label: impl Into<String>,
    ) -> Self {
        Self {
            stores,
            merge_dimension: merge_dimension.into(),
            merge_label: merge_label.into(),
        }
    }

    pub fn stores(&self) -> &[AnyStore] {
        &self.stores
    }
}

impl VariableStore for MergedVariableStore {
    fn variable_names(&self) -> Vec<String> {
        self.stores
            .first()
            .map(|s| s.variable_names())
            .unwrap_or_default()
    }

    fn variable_long_names(&self) -> Vec<(String, String)> {
        self.stores
            .first()
            .map(|s| s.variable_long_names())
            .unwrap_or_default()
    }

    /// `None` (with a warning) unless every store has the variable.
    fn variable(&self, name: &str) -> Option<AnyVariable> {
        if self.stores.is_empty() {
            return None;
        }
        let mut variables = Vec::with_capacity(self.stores.len());
        for (index, store) in self.stores.iter().enumerate() {
            match store.variable(name) {
                Some(variable) => variables.push(variable),
                None => {
                    warn!(store = index, variable = name, "Store in merge group lacks variable");
                    return None;
                }
            }
        }
        Some(MergedVariable::new(variables, &self.merge_dimension, &self.merge_label).into())
    }

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        if dimension == self.merge_dimension {
            return DimensionInfo::new(dimension)
                .with_label(self.merge_label.clone())
                .with_datatype(DataType::Integer);
        }
        self.stores
            .first()
            .map_or_else(|| DimensionInfo::new(dimension), |s| s.dimension_info(dimension))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{
        store::MemoryStore,
        variable::{DimBounds, SourceVariable, Variable},
    };

    fn run(offset: f64, with_salt: bool) -> AnyStore {
        let mut store = MemoryStore::new();
        store
            .add_variable(
                SourceVariable::builder(
                    "temp",
                    ["time"],
                    array![10.0, 12.0, 14.0].into_dyn() + offset,
                )
                .coords("time", array![0.0, 1.0, 2.0].into_dyn())
                .build()
                .unwrap(),
            )
            .unwrap();
        if with_salt {
            store
                .add_variable(
                    SourceVariable::builder("salt", ["time"], array![1.0, 2.0, 3.0].into_dyn())
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        store.into()
    }

    #[test]
    fn merged_slice_over_all_stores() {
        let store = MergedVariableStore::with_dimension(
            vec![run(0.0, true), run(1.0, true)],
            "run",
            "run number",
        );
        let temp = store.variable("temp").unwrap();
        assert_eq!(temp.dimensions(), vec!["run".to_string(), "time".to_string()]);
        let slice = temp
            .slice(&[DimBounds::new(Some(0.0), Some(1.0)), DimBounds::unbounded()])
            .unwrap();
        assert_eq!(
            slice.data,
            Some(array![[10.0, 12.0, 14.0], [11.0, 13.0, 15.0]].into_dyn())
        );
        assert_eq!(store.dimension_info("run").label, "run number");
        assert_eq!(temp.dimension_info("run").label, "run number");
    }

    #[test]
    fn missing_variable_in_one_store() {
        let store = MergedVariableStore::new(vec![run(0.0, true), run(1.0, false)]);
        assert!(store.variable("salt").is_none());
        assert!(store.variable("temp").is_some());
        assert_eq!(store.variable_names(), vec!["temp", "salt"]);
    }
}
