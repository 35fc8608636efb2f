use std::sync::Arc;

use async_trait::async_trait;
use gnmi_primitives::transport::{
    MutationError, Mutator, SnapshotAccessor, SnapshotError, Transport, TransportError,
};
use gnmi_primitives::tree;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::session::Session;
use crate::state::StateStore;
use crate::stream::SimStream;
use crate::topology;

/// A simulated telemetry target. Cheap to clone; clones share state.
#[derive(Clone, Debug)]
pub struct SimDevice {
    name: Arc<str>,
    store: Arc<StateStore>,
    config: Arc<SimConfig>,
}

impl SimDevice {
    /// A device holding the default topology for `config`.
    #[must_use]
    pub fn new(name: &str, config: SimConfig) -> Self {
        let tree = topology::default_tree(name, config.interfaces);
        Self::with_tree(name, config, tree)
    }

    #[must_use]
    pub fn with_tree(name: &str, config: SimConfig, tree: Value) -> Self {
        info!(%name, interfaces = config.interfaces, "simulated device up");
        Self {
            name: name.into(),
            store: Arc::new(StateStore::new(tree, config.change_capacity)),
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Names of every interface currently in the tree.
    #[must_use]
    pub fn interfaces(&self) -> Vec<String> {
        let Some(Value::Object(interfaces)) = self.store.read(topology::INTERFACES) else {
            return Vec::new();
        };

        interfaces
            .keys()
            .filter_map(|key| topology::interface_name(key))
            .map(str::to_owned)
            .collect()
    }
}

#[async_trait]
impl Transport for SimDevice {
    type Stream = SimStream;

    async fn open_stream(&self, target: &str) -> Result<SimStream, TransportError> {
        if self.config.faults.refuse_streams {
            return Err(TransportError::Open("connection refused".to_owned()));
        }

        if target != &*self.name {
            return Err(TransportError::Open(format!("unknown target {target}")));
        }

        let (stream, end) = SimStream::pair();
        let session = Session::new(Arc::clone(&self.store), Arc::clone(&self.config), end);

        drop(tokio::spawn(async move {
            if let Err(error) = session.serve().await {
                debug!(%error, "session ended");
            }
        }));

        Ok(stream)
    }
}

#[async_trait]
impl SnapshotAccessor for SimDevice {
    async fn read_subtree(&self, path: &str) -> Result<Value, SnapshotError> {
        self.store.read(path).ok_or_else(|| SnapshotError::NotFound {
            path: path.to_owned(),
        })
    }
}

#[async_trait]
impl Mutator for SimDevice {
    async fn write_leaf(&self, path: &str, value: &str) -> Result<(), MutationError> {
        self.store
            .write_leaf(path, tree::parse_leaf(value))
            .map_err(|error| MutationError::Rejected {
                path: path.to_owned(),
                reason: error.to_string(),
            })
    }

    async fn delete_path(&self, path: &str) -> Result<(), MutationError> {
        match self.store.delete(path) {
            Ok(Some(_leaves)) => Ok(()),
            Ok(None) => Err(MutationError::NotFound {
                path: path.to_owned(),
            }),
            Err(error) => Err(MutationError::Rejected {
                path: path.to_owned(),
                reason: error.to_string(),
            }),
        }
    }
}
