//! Shared vocabulary for the gNMI subscribe conformance workspace.
//!
//! - [`subscription`]: the per-scenario [`SubscriptionSpec`](subscription::SubscriptionSpec)
//! - [`wire`]: logical request and stream message shapes
//! - [`path`] / [`tree`]: path handling and state-tree walking
//! - [`transport`]: the collaborator traits a target must provide

pub mod path;
pub mod subscription;
pub mod transport;
pub mod tree;
pub mod wire;
