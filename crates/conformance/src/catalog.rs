//! The built-in subscribe-mode suite.

use core::time::Duration;

use gnmi_primitives::subscription::{SubMode, SubscriptionSpec};

use crate::exclusions::SkipList;
use crate::scenario::{Deadlines, Scenario, ScenarioKind};

pub const SUITE: &str = "gnmi-subscribe-modes";

pub const ON_CHANGE_PATH: &str = "/interfaces/interface[name={interface}]/state/mtu";
pub const NODE_PATH: &str = "/system/state/hostname";
pub const SUBTREE_PATH: &str = "/system/state";
pub const CONTAINER_PATH: &str = "/components";
pub const ROOT_PATH: &str = "/";
pub const DELETE_PATH: &str = "/system/config/hostname";
pub const DELETE_TREE_PATH: &str = "/system/config";

const TWO_SECONDS: Duration = Duration::from_secs(2);
const THREE_SECONDS: Duration = Duration::from_secs(3);
const FIVE_SECONDS: Duration = Duration::from_secs(5);

/// Subtree deletes cannot be driven reliably through the management plane yet.
pub const KNOWN_BROKEN: &[&str] = &["subscribeDeleteNodeLevel", "subscribeDeleteSubtreeLevel"];

#[must_use]
pub fn default_skip_list() -> SkipList {
    SkipList::new(KNOWN_BROKEN.iter().map(|name| format!("{SUITE}/{name}")))
}

#[must_use]
#[expect(clippy::too_many_lines, reason = "one entry per scenario")]
pub fn subscribe_modes(deadlines: &Deadlines) -> Vec<Scenario> {
    use ScenarioKind::*;

    let Deadlines { short, medium, long } = *deadlines;

    vec![
        Scenario::new(
            "subscribeOnChange",
            "f3c55aed-6522-458d-a3cb-e9eca005bcf1",
            OnChange,
            SubscriptionSpec::stream(ON_CHANGE_PATH, SubMode::OnChange, short),
        ),
        Scenario::new(
            "subscribeOnChangeHeartbeatInterval",
            "5defcb39-7ffa-4404-8eab-59499b50796e",
            OnChange,
            SubscriptionSpec::stream(ON_CHANGE_PATH, SubMode::OnChange, short).with_heartbeat(TWO_SECONDS),
        ),
        Scenario::new(
            "subscribeOnChangeDefinedNode",
            "1092dc1a-42c8-4125-b2a0-64596dc340ab",
            OnChange,
            SubscriptionSpec::stream(ON_CHANGE_PATH, SubMode::ServerDefined, short),
        ),
        Scenario::new(
            "subscribeOnChangeUnsupportedPath",
            "c003d854-6b41-4b0d-acdf-4cc77bd02252",
            OnChange,
            SubscriptionSpec::stream(SUBTREE_PATH, SubMode::OnChange, short).expecting_error(),
        ),
        Scenario::new(
            "subscribeOnChangeUpdatesOnly",
            "a242c00e-74e7-4749-83cf-9ee724c64901",
            OnChange,
            SubscriptionSpec::stream(ON_CHANGE_PATH, SubMode::OnChange, short).updates_only(),
        ),
        Scenario::new(
            "subscribeOnceRootLevel",
            "3507ab19-ffb9-4e30-8958-0bb2dc80b424",
            Once,
            SubscriptionSpec::once(ROOT_PATH, long),
        ),
        Scenario::new(
            "subscribeOnceContainerLevel",
            "42b4af42-2394-4945-b094-2a1130d2002d",
            Once,
            SubscriptionSpec::once(CONTAINER_PATH, medium),
        ),
        Scenario::new(
            "subscribeOnceSubtreeLevel",
            "349ef06f-eeaa-45f0-b463-86505dc57131",
            Once,
            SubscriptionSpec::once(SUBTREE_PATH, short),
        ),
        Scenario::new(
            "subscribeOnceNodeLevel",
            "bc3c26cc-259c-4b98-8b96-8f98e084724c",
            Once,
            SubscriptionSpec::once(NODE_PATH, short),
        ),
        Scenario::new(
            "subscribePollRootLevel",
            "c658fc60-bd58-4fcc-970c-b994a0cf0e94",
            Poll,
            SubscriptionSpec::poll(ROOT_PATH, long),
        ),
        Scenario::new(
            "subscribePollContainerLevel",
            "5f424b35-4d7f-44db-a4c2-0bd6f2370301",
            Poll,
            SubscriptionSpec::poll(CONTAINER_PATH, medium),
        ),
        Scenario::new(
            "subscribeOnceUpdatesOnly",
            "88b334bd-e835-4cb9-975f-e7b01bd6e1bf",
            UpdatesOnly,
            SubscriptionSpec::once(SUBTREE_PATH, short).updates_only(),
        ),
        Scenario::new(
            "subscribePollUpdatesOnly",
            "177c8d8d-a51b-448d-96b1-ed3e1dde0629",
            UpdatesOnly,
            SubscriptionSpec::poll(SUBTREE_PATH, short).updates_only(),
        ),
        Scenario::new(
            "subscribeSampleUpdatesOnly",
            "ebb593da-4f24-4394-80b9-4463a96843bb",
            UpdatesOnly,
            SubscriptionSpec::stream(SUBTREE_PATH, SubMode::Sample, short)
                .with_sample_interval(TWO_SECONDS)
                .updates_only(),
        ),
        Scenario::new(
            "subscribePollSubtreeLevel",
            "d298894b-3110-4bb3-b13f-3e572d57791e",
            Poll,
            SubscriptionSpec::poll(SUBTREE_PATH, short),
        ),
        Scenario::new(
            "subscribePollNodeLevel",
            "cb622b6e-5142-4c59-a6b9-603b45b8bcab",
            Poll,
            SubscriptionSpec::poll(NODE_PATH, short),
        ),
        Scenario::new(
            "subscribeSampleSubtreeLevel",
            "899345da-b715-4caa-a02f-2d03d18c233e",
            Sample,
            SubscriptionSpec::stream(SUBTREE_PATH, SubMode::Sample, short).with_sample_interval(TWO_SECONDS),
        ),
        Scenario::new(
            "subscribeSampleInvalidInterval",
            "8cf7ea62-5bda-4f71-bd86-fdce88ba2753",
            Sample,
            SubscriptionSpec::stream(NODE_PATH, SubMode::Sample, short)
                .with_sample_interval(Duration::from_nanos(1))
                .expecting_error(),
        ),
        Scenario::new(
            "subscribeSampleDefinedNode",
            "45305a9a-c602-421f-8f6a-21d520fea9f8",
            Sample,
            SubscriptionSpec::stream(NODE_PATH, SubMode::ServerDefined, short),
        ),
        Scenario::new(
            "subscribeMixedDefinedNode",
            "ae4c435a-9fa7-494a-94f7-75cd662c3d95",
            Sample,
            SubscriptionSpec::stream(SUBTREE_PATH, SubMode::ServerDefined, short),
        ),
        Scenario::new(
            "subscribeSampleRootLevel",
            "a495d0b5-482e-411b-9bac-2baa79776293",
            Root,
            SubscriptionSpec::stream(ROOT_PATH, SubMode::Sample, long).with_sample_interval(FIVE_SECONDS),
        ),
        Scenario::new(
            "subscribeSampleContainerLevel",
            "aeff11b5-aee2-4689-85e0-a124b5d73506",
            Sample,
            SubscriptionSpec::stream(CONTAINER_PATH, SubMode::Sample, long).with_sample_interval(FIVE_SECONDS),
        ),
        Scenario::new(
            "subscribeSampleNodeLevel",
            "880b3893-da72-44c5-998c-013f0303969f",
            Sample,
            SubscriptionSpec::stream(NODE_PATH, SubMode::Sample, short).with_sample_interval(TWO_SECONDS),
        ),
        Scenario::new(
            "subscribeDeleteNodeLevel",
            "529f58c0-8b9b-4820-aeb6-94feb1a68198",
            Delete,
            SubscriptionSpec::stream(DELETE_PATH, SubMode::Sample, short).with_sample_interval(TWO_SECONDS),
        ),
        Scenario::new(
            "subscribeDeleteSubtreeLevel",
            "e9d932d5-5fa5-4e00-8c60-cd8823fc34b2",
            Delete,
            SubscriptionSpec::stream(DELETE_TREE_PATH, SubMode::Sample, short).with_sample_interval(TWO_SECONDS),
        ),
        Scenario::new(
            "subscribeSampleSuppressRedundant",
            "5c6e0713-cb8d-43a5-bd8e-8a1ac395eab6",
            Suppress,
            SubscriptionSpec::stream(SUBTREE_PATH, SubMode::Sample, short)
                .with_sample_interval(TWO_SECONDS)
                .suppressing_redundant(),
        ),
        Scenario::new(
            "subscribeSampleHeartbeat",
            "8b58ff99-39fc-41e8-9589-b78da0aeca12",
            Suppress,
            SubscriptionSpec::stream(SUBTREE_PATH, SubMode::Sample, short)
                .with_sample_interval(TWO_SECONDS)
                .suppressing_redundant()
                .with_heartbeat(THREE_SECONDS),
        ),
    ]
}
