//! Collaborator interfaces the conformance engine is driven through.
//!
//! The engine never talks to a device directly. A target provides:
//!
//! - [`Transport`] to open a bidirectional [`SubscribeStream`]
//! - [`SnapshotAccessor`] for point-in-time reads of the state tree
//! - [`Mutator`] to change (or remove) state and provoke notifications
//!
//! Production adapters wrap a real gRPC session; tests use the in-memory
//! simulator.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::wire::{ClientMessage, ServerMessage};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    #[error("failed to open subscribe stream: {0}")]
    Open(String),

    #[error("failed to send on subscribe stream: {0}")]
    Send(String),

    #[error("failed to receive from subscribe stream: {0}")]
    Receive(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("no state at {path}")]
    NotFound { path: String },

    #[error("snapshot read failed: {0}")]
    Read(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MutationError {
    #[error("no state at {path}")]
    NotFound { path: String },

    #[error("target rejected mutation of {path}: {reason}")]
    Rejected { path: String, reason: String },
}

/// One open subscribe stream.
///
/// Dropping or [closing](SubscribeStream::close) the stream cancels the
/// subscription on the target.
#[async_trait]
pub trait SubscribeStream: Send {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError>;

    /// Next message from the target, `Ok(None)` once the target closed the stream.
    ///
    /// Must be cancel-safe: callers race it against their deadline.
    async fn recv(&mut self) -> Result<Option<ServerMessage>, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    type Stream: SubscribeStream;

    async fn open_stream(&self, target: &str) -> Result<Self::Stream, TransportError>;
}

#[async_trait]
pub trait SnapshotAccessor: Send + Sync {
    /// Current state rooted at `path`; a leaf path yields a scalar.
    async fn read_subtree(&self, path: &str) -> Result<Value, SnapshotError>;
}

/// Completion of a call marks the mutation as issued; the target's telemetry
/// pipeline may report it later.
#[async_trait]
pub trait Mutator: Send + Sync {
    async fn write_leaf(&self, path: &str, value: &str) -> Result<(), MutationError>;

    async fn delete_path(&self, path: &str) -> Result<(), MutationError>;
}
