use std::collections::BTreeMap;

use gnmi_primitives::tree;
use serde_json::Value;

use crate::exclusions::VolatileExclusionList;

/// Leaf path to rendered value, volatile paths removed.
pub type FlatSnapshot = BTreeMap<String, String>;

/// Turns a subtree read into flat leaves.
#[derive(Clone, Copy, Debug)]
pub struct StateSnapshotFlattener<'a> {
    exclusions: &'a VolatileExclusionList,
}

impl<'a> StateSnapshotFlattener<'a> {
    #[must_use]
    pub const fn new(exclusions: &'a VolatileExclusionList) -> Self {
        Self { exclusions }
    }

    #[must_use]
    pub fn flatten(&self, root: &str, snapshot: &Value) -> FlatSnapshot {
        tree::leaves(root, snapshot)
            .into_iter()
            .filter(|(path, _)| !self.exclusions.is_excluded(path))
            .collect()
    }
}
