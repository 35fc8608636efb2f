use core::time::Duration;

use gnmi_primitives::subscription::{serde_millis, serde_nanos};
use serde::{Deserialize, Serialize};

/// Leaves that only support sampled delivery.
pub const DEFAULT_ON_CHANGE_UNSUPPORTED: &[&str] = &[
    "/system/state/current-datetime",
    "/system/state/uptime",
    "/system/state/boot-time",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimConfig {
    /// Number of `EthernetN` interfaces in the default tree.
    pub interfaces: usize,

    #[serde(rename = "minSampleIntervalNs", with = "serde_nanos")]
    pub min_sample_interval: Duration,

    /// Path fragments an ON_CHANGE subscription may not cover.
    pub on_change_unsupported: Vec<String>,

    /// Changes a session may fall behind before its stream is failed.
    pub change_capacity: usize,

    pub faults: SimFaults,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            interfaces: 4,
            min_sample_interval: Duration::from_millis(1),
            on_change_unsupported: DEFAULT_ON_CHANGE_UNSUPPORTED
                .iter()
                .copied()
                .map(str::to_owned)
                .collect(),
            change_capacity: 256,
            faults: SimFaults::default(),
        }
    }
}

/// Deliberate protocol violations, all off by default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimFaults {
    /// Never send the sync-complete signal.
    pub drop_sync: bool,

    /// Deliver a wrong value for this leaf.
    pub corrupt_value: Option<String>,

    /// Added to every heartbeat period.
    #[serde(rename = "heartbeatDelayMs", with = "serde_millis")]
    pub heartbeat_delay: Duration,

    /// Added to every sample period.
    #[serde(rename = "sampleDelayMs", with = "serde_millis")]
    pub sample_delay: Duration,

    /// Resend unchanged leaves on sample ticks despite suppress-redundant.
    pub ignore_suppress: bool,

    /// Never push ON_CHANGE updates; deletes and periodic deliveries still flow.
    pub drop_on_change: bool,

    /// Send the initial dump even when updates-only was requested.
    pub leak_updates_only: bool,

    /// Report a subtree removal as one delete for its root.
    pub collapse_subtree_deletes: bool,

    /// Answer every subscription with this error status.
    pub reject_with: Option<String>,

    /// Accept subscriptions but never send anything.
    pub silent: bool,

    /// Fail to open streams at all.
    pub refuse_streams: bool,
}
