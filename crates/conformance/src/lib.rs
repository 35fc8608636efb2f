//! Subscribe-mode conformance engine
//!
//! Validates a telemetry target's subscribe service one scenario at a time:
//! the engine derives what the target must report for a subscription,
//! collects what it actually reports under a deadline, and reconciles the two.
//!
//! ## Pipeline
//!
//! - **request**: subscription spec to a validated wire request
//! - **flatten**: subtree read to `(path, value)` leaves, volatile paths removed
//! - **expected**: spec plus leaves to the expected [`OutcomeSet`]
//! - **collector**: stream messages to the observed [`OutcomeSet`]
//! - **verify** / **timing**: set reconciliation and cadence bounds
//!
//! [`ScenarioRunner`] strings these together for every [`ScenarioKind`].
//! The target itself is reached only through the traits in
//! [`gnmi_primitives::transport`].

pub mod catalog;
pub mod collector;
pub mod error;
pub mod exclusions;
pub mod expected;
pub mod flatten;
pub mod lifecycle;
pub mod outcome;
pub mod report;
pub mod request;
pub mod runner;
pub mod scenario;
pub mod timing;
pub mod verify;

pub use error::{Phase, ScenarioError};
pub use outcome::OutcomeSet;
pub use report::{PhaseReport, ScenarioReport, Verdict};
pub use runner::{RunnerConfig, ScenarioRunner, Target};
pub use scenario::{Deadlines, Scenario, ScenarioKind};

#[cfg(test)]
use gnmi_sim as _;
