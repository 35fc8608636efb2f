//! Expected vs observed reconciliation.

use core::fmt::{self, Display, Formatter};

use crate::outcome::{OutcomeKey, OutcomeSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub key: OutcomeKey,
    pub expected: String,
    pub observed: String,
}

/// Structured difference between two outcome sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeDiff {
    pub missing: Vec<OutcomeKey>,
    pub extra: Vec<OutcomeKey>,
    pub mismatched: Vec<Mismatch>,
}

impl OutcomeDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.mismatched.is_empty()
    }
}

impl Display for OutcomeDiff {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "response mismatch (-missing +extra ~mismatched):")?;
        for key in &self.missing {
            writeln!(f, "  - {key}")?;
        }
        for key in &self.extra {
            writeln!(f, "  + {key}")?;
        }
        for mismatch in &self.mismatched {
            writeln!(
                f,
                "  ~ {}: expected {}, observed {}",
                mismatch.key, mismatch.expected, mismatch.observed
            )?;
        }
        Ok(())
    }
}

/// Compares two sets.
///
/// Data records compare on delete-ness and value only. The sync sentinel
/// compares on presence. An expected error holds a marker the observed
/// description must contain.
#[must_use]
pub fn diff(expected: &OutcomeSet, observed: &OutcomeSet) -> OutcomeDiff {
    let mut diff = OutcomeDiff::default();

    for (path, want) in expected.data() {
        match observed.get(path) {
            None => diff.missing.push(OutcomeKey::Path(path.clone())),
            Some(got) if got != want => diff.mismatched.push(Mismatch {
                key: OutcomeKey::Path(path.clone()),
                expected: want.state.to_string(),
                observed: got.state.to_string(),
            }),
            Some(_) => {}
        }
    }

    diff.extra.extend(
        observed
            .data()
            .keys()
            .filter(|path| !expected.contains_path(path))
            .cloned()
            .map(OutcomeKey::Path),
    );

    match (expected.has_sync(), observed.has_sync()) {
        (true, false) => diff.missing.push(OutcomeKey::Sync),
        (false, true) => diff.extra.push(OutcomeKey::Sync),
        _ => {}
    }

    match (expected.error(), observed.error()) {
        (Some(_), None) => diff.missing.push(OutcomeKey::Error),
        (None, Some(_)) => diff.extra.push(OutcomeKey::Error),
        (Some(marker), Some(description)) if !description.contains(marker) => {
            diff.mismatched.push(Mismatch {
                key: OutcomeKey::Error,
                expected: format!("containing {marker:?}"),
                observed: format!("{description:?}"),
            });
        }
        _ => {}
    }

    diff
}

pub fn verify(expected: &OutcomeSet, observed: &OutcomeSet) -> Result<(), OutcomeDiff> {
    let diff = diff(expected, observed);
    if diff.is_empty() {
        Ok(())
    } else {
        Err(diff)
    }
}
