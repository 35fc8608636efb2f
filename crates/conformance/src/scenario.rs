//! Scenarios are plain data; one generic runner executes every kind.

use core::time::Duration;

use gnmi_primitives::subscription::{serde_millis, SubscriptionSpec};
use serde::{Deserialize, Serialize};

/// The phase plan a scenario follows after its initial phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScenarioKind {
    /// Toggle the subscribed leaf and expect the new value (after a
    /// heartbeat redelivery when one is configured).
    OnChange,
    Once,
    /// A second poll must return a fresh full delivery.
    Poll,
    UpdatesOnly,
    /// SAMPLE subscriptions must redeliver within the sample interval.
    Sample,
    Root,
    /// Delete the subscribed node and expect delete records for it.
    Delete,
    /// Unchanged state stays quiet except at heartbeat boundaries.
    Suppress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    pub uuid: String,
    pub kind: ScenarioKind,
    /// The path may hold the interface placeholder.
    pub spec: SubscriptionSpec,
}

impl Scenario {
    #[must_use]
    pub fn new(name: &str, uuid: &str, kind: ScenarioKind, spec: SubscriptionSpec) -> Self {
        Self {
            name: name.to_owned(),
            uuid: uuid.to_owned(),
            kind,
            spec,
        }
    }

    /// Substitutes `interface` into the path. Error scenarios never target an
    /// interface and are returned unchanged.
    #[must_use]
    pub fn resolve(&self, interface: Option<&str>) -> SubscriptionSpec {
        match interface {
            Some(interface) if !self.spec.expect_protocol_error => self.spec.for_interface(interface),
            _ => self.spec.clone(),
        }
    }
}

/// Named per-scenario deadlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadlines {
    #[serde(rename = "shortMs", with = "serde_millis")]
    pub short: Duration,
    #[serde(rename = "mediumMs", with = "serde_millis")]
    pub medium: Duration,
    #[serde(rename = "longMs", with = "serde_millis")]
    pub long: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(5),
            medium: Duration::from_secs(10),
            long: Duration::from_secs(30),
        }
    }
}
