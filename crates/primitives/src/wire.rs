//! Logical message shapes exchanged on a subscribe stream.

use serde::{Deserialize, Serialize};

use crate::subscription::{Mode, SubMode};

/// The subscribe request as sent to the target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub target: String,
    pub subscriptions: Vec<Subscription>,
    pub mode: Mode,
    pub updates_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_mode: Option<SubMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_interval_ns: Option<u64>,
    pub suppress_redundant: bool,
    pub heartbeat_interval_ns: u64,
}

/// Client to target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Subscribe(SubscribeRequest),
    /// Asks a POLL subscription for a fresh delivery.
    Poll,
}

/// Target to client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerMessage {
    Update { path: String, value: String },
    Delete { path: String },
    SyncComplete,
    ErrorStatus { description: String },
}

impl ServerMessage {
    #[must_use]
    pub fn update(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Update {
            path: path.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::Delete { path: path.into() }
    }

    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self::ErrorStatus {
            description: description.into(),
        }
    }
}
