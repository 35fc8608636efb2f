//! In-memory telemetry target for exercising the conformance engine.
//!
//! [`SimDevice`] implements every collaborator trait of
//! [`gnmi_primitives::transport`]. Each opened stream is served by its own
//! session task:
//!
//! ```text
//! ┌──────────────┐   ClientMessage    ┌───────────────┐
//! │  SimStream   │ ─────────────────► │    Session    │
//! │ (conformance │                    │ (device task) │◄── StateStore change feed
//! │    engine)   │ ◄───────────────── │               │
//! └──────────────┘   ServerMessage    └───────────────┘
//! ```
//!
//! Protocol faults can be switched on through [`SimFaults`] to check that
//! the engine notices them.

pub mod config;
pub mod device;
mod session;
pub mod state;
pub mod stream;
pub mod topology;

pub use config::{SimConfig, SimFaults};
pub use device::SimDevice;
pub use stream::SimStream;
