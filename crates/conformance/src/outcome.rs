//! The reconciliation unit: what happened (or should happen) per path in one
//! collection phase.
//!
//! Sync and error are explicit fields rather than reserved keys, so no
//! device path can ever collide with them.

use core::fmt::{self, Display, Formatter};
use std::collections::BTreeMap;

use gnmi_primitives::path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeafState {
    Value(String),
    Deleted,
}

impl Display for LeafState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value:?}"),
            Self::Deleted => f.write_str("<deleted>"),
        }
    }
}

/// Outcome for one path.
///
/// `matched` is bookkeeping (the key was expected when it was recorded) and
/// takes no part in equality.
#[derive(Clone, Debug, Eq)]
pub struct OutcomeRecord {
    pub matched: bool,
    pub state: LeafState,
}

impl PartialEq for OutcomeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl OutcomeRecord {
    #[must_use]
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            matched: true,
            state: LeafState::Value(value.into()),
        }
    }

    #[must_use]
    pub const fn deleted() -> Self {
        Self {
            matched: true,
            state: LeafState::Deleted,
        }
    }

    #[must_use]
    pub const fn is_delete(&self) -> bool {
        matches!(self.state, LeafState::Deleted)
    }
}

/// One classified event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Data { path: String, record: OutcomeRecord },
    Sync,
    Error { description: String },
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutcomeKey {
    Path(String),
    Sync,
    Error,
}

impl Display for OutcomeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Sync => f.write_str("SYNC"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeSet {
    data: BTreeMap<String, OutcomeRecord>,
    sync: bool,
    error: Option<String>,
}

impl OutcomeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event; a later record for the same path replaces the
    /// earlier one.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Data { path, record } => drop(self.data.insert(path, record)),
            Outcome::Sync => self.sync = true,
            Outcome::Error { description } => self.error = Some(description),
        }
    }

    #[must_use]
    pub fn with(mut self, outcome: Outcome) -> Self {
        self.record(outcome);
        self
    }

    #[must_use]
    pub fn with_value(self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(Outcome::Data {
            path: path.into(),
            record: OutcomeRecord::value(value),
        })
    }

    #[must_use]
    pub fn with_deleted(self, path: impl Into<String>) -> Self {
        self.with(Outcome::Data {
            path: path.into(),
            record: OutcomeRecord::deleted(),
        })
    }

    #[must_use]
    pub fn with_sync(self) -> Self {
        self.with(Outcome::Sync)
    }

    #[must_use]
    pub fn with_error(self, description: impl Into<String>) -> Self {
        self.with(Outcome::Error {
            description: description.into(),
        })
    }

    #[must_use]
    pub const fn data(&self) -> &BTreeMap<String, OutcomeRecord> {
        &self.data
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&OutcomeRecord> {
        self.data.get(path)
    }

    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        self.data.contains_key(path)
    }

    /// Expected paths equal to or underneath `ancestor`.
    pub fn paths_within<'a>(&'a self, ancestor: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.data
            .keys()
            .map(String::as_str)
            .filter(move |candidate| path::is_within(ancestor, candidate))
    }

    #[must_use]
    pub const fn has_sync(&self) -> bool {
        self.sync
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() + usize::from(self.sync) + usize::from(self.error.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn keys(&self) -> Vec<OutcomeKey> {
        let mut keys: Vec<_> = self.data.keys().cloned().map(OutcomeKey::Path).collect();
        if self.sync {
            keys.push(OutcomeKey::Sync);
        }
        if self.error.is_some() {
            keys.push(OutcomeKey::Error);
        }
        keys
    }

    /// Whether every data record and the sync sentinel of `self` already
    /// show up identically in `observed`.
    #[must_use]
    pub fn is_covered_by(&self, observed: &Self) -> bool {
        (!self.sync || observed.sync)
            && self
                .data
                .iter()
                .all(|(path, record)| observed.data.get(path) == Some(record))
    }
}
