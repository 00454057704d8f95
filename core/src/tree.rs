//! Checkbox-style variable selection trees.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the schema node that collects variables the schema does not list.
pub const OTHER_NODE: &str = "other";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Schema node lacks a name (child of {parent})")]
    MissingName { parent: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Node stands for a variable and carries a checkbox.
    #[serde(default)]
    pub selectable: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn find(&self, name: &str) -> Option<&TreeNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut TreeNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    /// Removes the first descendant called `name`.
    fn remove_descendant(&mut self, name: &str) -> bool {
        if let Some(pos) = self.children.iter().position(|c| c.name == name) {
            self.children.remove(pos);
            return true;
        }
        self.children.iter_mut().any(|c| c.remove_descendant(name))
    }
}

/// Prunes `schema` against the `(name, long name)` pairs of a store.
///
/// The root is always kept.
pub fn prune_schema(
    schema: &TreeNode,
    variables: &[(String, String)],
) -> Result<TreeNode, TreeError> {
    let long_names: HashMap<&str, &str> = variables
        .iter()
        .map(|(name, long_name)| (name.as_str(), long_name.as_str()))
        .collect();

    let mut root = schema.clone();
    if root.name.is_empty() {
        return Err(TreeError::MissingName {
            parent: String::new(),
        });
    }
    let mut found = HashSet::new();
    filter_node(&mut root, &long_names, &mut found)?;

    let mut remaining: Vec<(&str, &str)> = variables
        .iter()
        .filter(|(name, _)| !found.contains(name.as_str()))
        .map(|(name, long_name)| (name.as_str(), long_name.as_str()))
        .collect();
    remaining.sort_by_key(|(_, long_name)| long_name.to_lowercase());

    if remaining.is_empty() {
        if root.name != OTHER_NODE {
            root.remove_descendant(OTHER_NODE);
        }
    } else if let Some(other) = root.find_mut(OTHER_NODE) {
        other.children.extend(remaining.into_iter().map(|(name, long_name)| TreeNode {
            name: name.to_string(),
            label: Some(long_name.to_string()),
            selectable: true,
            selected: false,
            children: Vec::new(),
        }));
    }
    Ok(root)
}

/// Marks variable nodes and drops children without variables below them.
/// Returns whether `node` or a descendant names a variable.
fn filter_node(
    node: &mut TreeNode,
    long_names: &HashMap<&str, &str>,
    found: &mut HashSet<String>,
) -> Result<bool, TreeError> {
    let mut any = false;
    if let Some(long_name) = long_names.get(node.name.as_str()) {
        node.label.get_or_insert_with(|| long_name.to_string());
        node.selectable = true;
        found.insert(node.name.clone());
        any = true;
    }

    let children = std::mem::take(&mut node.children);
    for mut child in children {
        if child.name.is_empty() {
            return Err(TreeError::MissingName {
                parent: node.name.clone(),
            });
        }
        let keep = filter_node(&mut child, long_names, found)?;
        any |= keep;
        if keep || child.name == OTHER_NODE {
            node.children.push(child);
        }
    }
    Ok(any)
}
