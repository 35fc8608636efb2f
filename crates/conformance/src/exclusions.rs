//! Read-only run configuration: volatile paths and known-broken scenarios.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Path fragments whose values move on their own (counters, clocks,
/// process tables) and are left out of every comparison.
pub const DEFAULT_VOLATILE_PATHS: &[&str] = &[
    // TODO: drop the loopback/bond entries once their counters stop leaking into state
    "/ethernet/state/counters/",
    "/interfaces/interface[name=Loopback0]",
    "/interfaces/interface[name=bond0]",
    "/qos/interfaces/interface",
    "/snmp/engine/version/",
    "/system/mount-points/mount-point",
    "/system/processes/process",
    "/system/cpus/cpu",
    "/system/crm/threshold",
    "/system/ntp/",
    "/system/memory/",
    "/system/ssh-server/ssh-server-vrfs",
    "/subinterface[index=0]/ipv4/unnumbered/",
    "/subinterface[index=0]/ipv4/sag-ipv4/",
    "/subinterface[index=0]/ipv6/sag-ipv6/",
    "/gnmi-pathz-policy-counters/paths/path",
    "/system/state/boot-time",
    "/system/state/uptime",
    "/system/state/current-datetime",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolatileExclusionList {
    fragments: Vec<String>,
}

impl Default for VolatileExclusionList {
    fn default() -> Self {
        Self::new(DEFAULT_VOLATILE_PATHS.iter().copied())
    }
}

impl VolatileExclusionList {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            fragments: Vec::new(),
        }
    }

    #[must_use]
    pub fn extended<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments.extend(fragments.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.fragments
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
    }

    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Scenarios known to fail for reasons outside the target under test, keyed
/// `"<suite>/<scenario>"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipList {
    entries: BTreeSet<String>,
}

impl SkipList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn extended<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.extend(entries.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn contains(&self, suite: &str, scenario: &str) -> bool {
        self.entries.contains(&format!("{suite}/{scenario}"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_list_drops_clocks_and_counters() {
        let list = VolatileExclusionList::default();

        assert!(list.is_excluded("/system/state/uptime"), "uptime");
        assert!(list.is_excluded("/system/memory/state/free"), "memory");
        assert!(
            list.is_excluded("/interfaces/interface[name=Ethernet0]/ethernet/state/counters/in-octets"),
            "counters anywhere in the path"
        );
        assert!(!list.is_excluded("/system/state/hostname"), "stable leaf kept");
    }

    #[test]
    fn extension_keeps_defaults() {
        let list = VolatileExclusionList::default().extended(["/lldp/"]);

        assert!(list.is_excluded("/lldp/state/chassis-id"), "added fragment");
        assert!(list.is_excluded("/system/state/boot-time"), "default kept");
        assert!(!VolatileExclusionList::empty().is_excluded("/system/state/uptime"), "empty list");
    }

    #[test]
    fn skip_list_is_suite_scoped() {
        let skip = SkipList::new(["suite-a/broken"]);

        assert!(skip.contains("suite-a", "broken"), "listed");
        assert!(!skip.contains("suite-b", "broken"), "other suite");

        let skip = skip.extended(["suite-b/flaky"]);
        assert!(skip.contains("suite-a", "broken"), "kept");
        assert!(skip.contains("suite-b", "flaky"), "added");
        assert_eq!(skip.len(), 2, "two entries");
    }
}
