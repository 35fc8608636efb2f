//! Derivation of the expected [`OutcomeSet`] (the oracle) for each phase.
//!
//! All functions are pure: the same spec and snapshot always produce the same
//! set.

use gnmi_primitives::path;
use gnmi_primitives::subscription::SubscriptionSpec;

use crate::flatten::FlatSnapshot;
use crate::outcome::OutcomeSet;

/// Marker a rejected request's status description must carry.
pub const INVALID_ARGUMENT_MARKER: &str = "InvalidArgument";

/// Expected outcome of the initial phase.
///
/// `snapshot` is ignored under updates-only: the target is not obliged to
/// enumerate pre-existing state then, so only the sync sentinel is expected.
#[must_use]
pub fn initial(spec: &SubscriptionSpec, snapshot: Option<&FlatSnapshot>) -> OutcomeSet {
    if spec.expect_protocol_error {
        return OutcomeSet::new().with_error(INVALID_ARGUMENT_MARKER);
    }

    let leaves = snapshot.filter(|_| !spec.updates_only);

    leaves
        .into_iter()
        .flatten()
        .fold(OutcomeSet::new(), |set, (path, value)| {
            set.with_value(path.as_str(), value.as_str())
        })
        .with_sync()
}

/// A poll response is a complete delivery of its own, closed by a sync.
#[must_use]
pub fn poll_response(snapshot: &FlatSnapshot) -> OutcomeSet {
    redelivery(snapshot).with_sync()
}

/// Unchanged state delivered again by a sample tick or heartbeat. The
/// stream already synced, so no sentinel.
#[must_use]
pub fn redelivery(snapshot: &FlatSnapshot) -> OutcomeSet {
    snapshot
        .iter()
        .fold(OutcomeSet::new(), |set, (path, value)| {
            set.with_value(path.as_str(), value.as_str())
        })
}

/// The single leaf that was written, carrying its new value.
#[must_use]
pub fn mutation(path: &str, value: &str) -> OutcomeSet {
    OutcomeSet::new().with_value(path, value)
}

/// Removal of `root`: every leaf previously known under it turns into a
/// delete record. With nothing known below, `root` itself is the record.
#[must_use]
pub fn deletion(root: &str, known: &FlatSnapshot) -> OutcomeSet {
    let known_below = known
        .keys()
        .filter(|leaf| path::is_within(root, leaf))
        .fold(OutcomeSet::new(), |set, leaf| set.with_deleted(leaf.as_str()));

    if known_below.data().is_empty() {
        return OutcomeSet::new().with_deleted(root);
    }

    known_below
}
