use enum_dispatch::enum_dispatch;
use thiserror::Error;

use crate::{
    tree::{prune_schema, TreeError, TreeNode},
    variable::{AnyVariable, DimensionInfo, Variable},
};

mod custom;
mod memory;
mod merged;

pub use custom::CustomVariableStore;
pub use memory::MemoryStore;
pub use merged::MergedVariableStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store already contains a variable named {0}")]
    DuplicateVariable(String),
}

/// A named collection of variables.
#[enum_dispatch]
pub trait VariableStore {
    /// Short names in store order.
    fn variable_names(&self) -> Vec<String>;

    /// `(short name, long name)` pairs in store order.
    fn variable_long_names(&self) -> Vec<(String, String)> {
        self.variable_names()
            .into_iter()
            .filter_map(|name| {
                let long_name = self.variable(&name)?.long_name().to_string();
                Some((name, long_name))
            })
            .collect()
    }

    fn variable(&self, name: &str) -> Option<AnyVariable>;

    fn dimension_info(&self, dimension: &str) -> DimensionInfo {
        DimensionInfo::new(dimension)
    }

    /// Selection tree built from `schema`: nodes naming no variable (and
    /// containing none) are dropped, variables missing from the schema are
    /// appended under the `other` node.
    fn variable_tree(&self, schema: &TreeNode) -> Result<TreeNode, TreeError> {
        prune_schema(schema, &self.variable_long_names())
    }
}

#[enum_dispatch(VariableStore)]
#[derive(Debug, Clone)]
pub enum AnyStore {
    MemoryStore,
    MergedVariableStore,
    CustomVariableStore,
}
