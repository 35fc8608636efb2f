//! The simulated device's state tree and its change feed.

use eyre::{bail, OptionExt, Result as EyreResult};
use gnmi_primitives::path;
use gnmi_primitives::tree;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::trace;

const UPTIME: [&str; 3] = ["system", "state", "uptime"];
const CURRENT_DATETIME: [&str; 3] = ["system", "state", "current-datetime"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Updated { path: String, value: String },
    /// `leaves` are every leaf that lived under `root`.
    Deleted { root: String, leaves: Vec<String> },
}

#[derive(Debug)]
pub struct StateStore {
    tree: RwLock<Value>,
    changes: broadcast::Sender<Change>,
}

impl StateStore {
    /// `capacity` bounds how many changes a slow session may fall behind.
    #[must_use]
    pub fn new(tree: Value, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            tree: RwLock::new(tree),
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    /// Subtree at `path`, `None` if nothing lives there.
    ///
    /// Every read advances the clock leaves, as a real device's would between
    /// two reads.
    pub fn read(&self, path: &str) -> Option<Value> {
        let mut tree = self.tree.write();
        tick(&mut tree);
        lookup(&tree, path).cloned()
    }

    /// Flattened leaves under `path`; empty if the path does not exist.
    pub fn leaves(&self, path: &str) -> Vec<(String, String)> {
        self.read(path)
            .map(|subtree| tree::leaves(path, &subtree))
            .unwrap_or_default()
    }

    /// Sets a leaf, creating missing containers on the way.
    pub fn write_leaf(&self, path: &str, value: Value) -> EyreResult<()> {
        let elements = path::split(path);
        let Some((leaf, parents)) = elements.split_last() else {
            bail!("cannot overwrite the root");
        };

        let rendered = tree::render_leaf(&value).ok_or_eyre("leaf value must be a scalar")?;

        {
            let mut tree = self.tree.write();
            let mut node = &mut *tree;
            for element in parents {
                node = container_mut(node)?
                    .entry((*element).to_owned())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
            drop(container_mut(node)?.insert((*leaf).to_owned(), value));
        }

        trace!(%path, value = %rendered, "leaf written");
        self.publish(Change::Updated {
            path: path.to_owned(),
            value: rendered,
        });
        Ok(())
    }

    /// Removes the node at `path`, returning the leaves that went with it.
    /// `Ok(None)` when nothing lives there.
    pub fn delete(&self, path: &str) -> EyreResult<Option<Vec<String>>> {
        let elements = path::split(path);
        let Some((last, parents)) = elements.split_last() else {
            bail!("cannot delete the root");
        };

        let removed = {
            let mut tree = self.tree.write();
            let mut node = &mut *tree;
            for element in parents {
                let Some(child) = node.get_mut(*element) else {
                    return Ok(None);
                };
                node = child;
            }
            node.as_object_mut().and_then(|children| children.remove(*last))
        };

        let Some(removed) = removed else {
            return Ok(None);
        };

        let leaves: Vec<String> = tree::leaves(path, &removed)
            .into_iter()
            .map(|(leaf, _)| leaf)
            .collect();

        trace!(%path, count = leaves.len(), "subtree deleted");
        self.publish(Change::Deleted {
            root: path.to_owned(),
            leaves: leaves.clone(),
        });
        Ok(Some(leaves))
    }

    fn publish(&self, change: Change) {
        // No live subscription is not an error.
        let _ignored = self.changes.send(change);
    }
}

fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path::split(path)
        .into_iter()
        .try_fold(tree, |node, element| node.get(element))
}

fn container_mut(node: &mut Value) -> EyreResult<&mut Map<String, Value>> {
    node.as_object_mut()
        .ok_or_eyre("path runs through a leaf")
}

#[expect(clippy::integer_division, reason = "whole hours and minutes")]
fn tick(tree: &mut Value) {
    let Some(uptime) = get_mut(tree, &UPTIME) else {
        return;
    };

    let seconds = uptime.as_u64().unwrap_or_default().saturating_add(1);
    *uptime = Value::from(seconds);

    if let Some(datetime) = get_mut(tree, &CURRENT_DATETIME) {
        let (hours, rest) = ((seconds / 3600) % 24, seconds % 3600);
        *datetime = Value::from(format!("2024-01-01T{hours:02}:{:02}:{:02}Z", rest / 60, rest % 60));
    }
}

fn get_mut<'a>(tree: &'a mut Value, elements: &[&str]) -> Option<&'a mut Value> {
    elements
        .iter()
        .try_fold(tree, |node, element| node.get_mut(*element))
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_ok, assert_some};
    use serde_json::json;

    use super::*;

    fn store() -> StateStore {
        StateStore::new(
            json!({
                "system": {
                    "state": { "hostname": "sw1", "uptime": 10, "current-datetime": "x" },
                    "config": { "hostname": "sw1", "domain-name": "lab" },
                },
            }),
            16,
        )
    }

    #[test]
    fn reads_advance_the_clock() {
        let store = store();

        let first = assert_some!(store.read("/system/state/uptime"));
        let second = assert_some!(store.read("/system/state/uptime"));

        assert_eq!(first, json!(11), "ticked once");
        assert_eq!(second, json!(12), "ticked again");
        assert_eq!(
            store.read("/system/state/hostname"),
            Some(json!("sw1")),
            "stable leaves untouched"
        );
    }

    #[test]
    fn writes_create_containers_and_publish() {
        let store = store();
        let mut changes = store.subscribe();

        assert_ok!(store.write_leaf("/interfaces/interface[name=Ethernet0]/state/mtu", json!(9000)));

        assert_eq!(
            store.read("/interfaces/interface[name=Ethernet0]/state/mtu"),
            Some(json!(9000)),
            "written"
        );
        assert_eq!(
            assert_ok!(changes.try_recv()),
            Change::Updated {
                path: "/interfaces/interface[name=Ethernet0]/state/mtu".to_owned(),
                value: "9000".to_owned(),
            },
            "published"
        );
    }

    #[test]
    fn subtree_delete_lists_every_leaf() {
        let store = store();
        let mut changes = store.subscribe();

        let leaves = assert_some!(assert_ok!(store.delete("/system/config")));
        assert_eq!(
            leaves,
            vec!["/system/config/domain-name".to_owned(), "/system/config/hostname".to_owned()],
            "both leaves"
        );
        assert_none!(store.read("/system/config"));
        assert!(
            matches!(assert_ok!(changes.try_recv()), Change::Deleted { root, .. } if root == "/system/config"),
            "published"
        );

        assert_none!(assert_ok!(store.delete("/system/config")));
    }
}
