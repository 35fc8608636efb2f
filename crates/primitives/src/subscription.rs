use core::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder in path templates that is replaced with the selected interface.
pub const INTERFACE_PLACEHOLDER: &str = "{interface}";

/// How the subscription list delivers data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    Stream,
    Once,
    Poll,
}

/// Delivery discipline of a streaming subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubMode {
    OnChange,
    Sample,
    /// The target picks the cadence per leaf.
    ServerDefined,
}

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpecError {
    #[error("subscription path must be absolute")]
    RelativePath,

    #[error("sample interval is only allowed for STREAM/SAMPLE subscriptions")]
    UnexpectedSampleInterval,

    #[error("STREAM/SAMPLE subscriptions require a sample interval")]
    MissingSampleInterval,

    #[error("heartbeat interval is only allowed for STREAM subscriptions")]
    UnexpectedHeartbeat,

    #[error("STREAM subscriptions require a sub-mode")]
    MissingSubMode,

    #[error("deadline must be non-zero")]
    ZeroDeadline,
}

/// Everything one scenario asks of the target's subscribe service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    pub path: String,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_mode: Option<SubMode>,
    #[serde(default, rename = "sampleIntervalNs", with = "serde_nanos")]
    pub sample_interval: Duration,
    #[serde(default, rename = "heartbeatIntervalNs", with = "serde_nanos")]
    pub heartbeat_interval: Duration,
    #[serde(default)]
    pub suppress_redundant: bool,
    #[serde(default)]
    pub updates_only: bool,
    #[serde(default)]
    pub expect_protocol_error: bool,
    #[serde(rename = "deadlineMs", with = "serde_millis")]
    pub deadline: Duration,
}

impl SubscriptionSpec {
    #[must_use]
    pub fn stream(path: impl Into<String>, sub_mode: SubMode, deadline: Duration) -> Self {
        Self::new(path.into(), Mode::Stream, Some(sub_mode), deadline)
    }

    #[must_use]
    pub fn once(path: impl Into<String>, deadline: Duration) -> Self {
        Self::new(path.into(), Mode::Once, None, deadline)
    }

    #[must_use]
    pub fn poll(path: impl Into<String>, deadline: Duration) -> Self {
        Self::new(path.into(), Mode::Poll, None, deadline)
    }

    const fn new(path: String, mode: Mode, sub_mode: Option<SubMode>, deadline: Duration) -> Self {
        Self {
            path,
            mode,
            sub_mode,
            sample_interval: Duration::ZERO,
            heartbeat_interval: Duration::ZERO,
            suppress_redundant: false,
            updates_only: false,
            expect_protocol_error: false,
            deadline,
        }
    }

    #[must_use]
    pub const fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub const fn suppressing_redundant(mut self) -> Self {
        self.suppress_redundant = true;
        self
    }

    #[must_use]
    pub const fn updates_only(mut self) -> Self {
        self.updates_only = true;
        self
    }

    #[must_use]
    pub const fn expecting_error(mut self) -> Self {
        self.expect_protocol_error = true;
        self
    }

    #[must_use]
    pub fn is_sample(&self) -> bool {
        self.mode == Mode::Stream && self.sub_mode == Some(SubMode::Sample)
    }

    #[must_use]
    pub fn needs_interface(&self) -> bool {
        self.path.contains(INTERFACE_PLACEHOLDER)
    }

    /// Returns a copy with the interface placeholder substituted.
    #[must_use]
    pub fn for_interface(&self, interface: &str) -> Self {
        Self {
            path: self.path.replace(INTERFACE_PLACEHOLDER, interface),
            ..self.clone()
        }
    }

    /// Local consistency check run before a request is put on the wire.
    ///
    /// Sample interval is set iff the sub-mode is SAMPLE, heartbeats only
    /// apply to STREAM subscriptions.
    pub fn validate(&self) -> Result<(), SpecError> {
        if !self.path.starts_with('/') {
            return Err(SpecError::RelativePath);
        }

        if self.deadline.is_zero() {
            return Err(SpecError::ZeroDeadline);
        }

        if self.mode == Mode::Stream && self.sub_mode.is_none() {
            return Err(SpecError::MissingSubMode);
        }

        match (self.is_sample(), self.sample_interval.is_zero()) {
            (true, true) => return Err(SpecError::MissingSampleInterval),
            (false, false) => return Err(SpecError::UnexpectedSampleInterval),
            _ => {}
        }

        if self.mode != Mode::Stream && !self.heartbeat_interval.is_zero() {
            return Err(SpecError::UnexpectedHeartbeat);
        }

        Ok(())
    }
}

/// `Duration` as integer nanoseconds, the unit intervals travel in.
pub mod serde_nanos {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

pub mod serde_millis {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
