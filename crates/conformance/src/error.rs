use core::fmt::{self, Display, Formatter};

use gnmi_primitives::subscription::SpecError;
use gnmi_primitives::transport::{MutationError, SnapshotError, TransportError};
use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::outcome::OutcomeSet;
use crate::timing::TimingViolation;
use crate::verify::OutcomeDiff;

/// One collection window of a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Poll,
    Redelivery,
    MutationEcho,
    DeletionEcho,
    QuietWindow,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initial => "initial",
            Self::Poll => "poll",
            Self::Redelivery => "redelivery",
            Self::MutationEcho => "mutation echo",
            Self::DeletionEcho => "deletion echo",
            Self::QuietWindow => "quiet window",
        })
    }
}

/// Why a scenario failed. Every variant is local to its scenario.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ScenarioError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("target returned an error status in the {phase} phase: {description}")]
    Protocol { phase: Phase, description: String },

    #[error("deadline exceeded in the {phase} phase, observed [{}]", key_list(.observed))]
    DeadlineExceeded { phase: Phase, observed: OutcomeSet },

    #[error("target closed the stream in the {phase} phase, observed [{}]", key_list(.observed))]
    StreamClosed { phase: Phase, observed: OutcomeSet },

    #[error("{phase} phase: {diff}")]
    Mismatch { phase: Phase, diff: OutcomeDiff },

    #[error("{phase} phase: {violation}")]
    Timing {
        phase: Phase,
        #[source]
        violation: TimingViolation,
    },

    #[error("invalid subscription: {0}")]
    InvalidSpec(#[from] SpecError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("expected an error status but got none, observed [{}]", key_list(.observed))]
    MissingError { observed: OutcomeSet },

    #[error("error status is not an InvalidArgument: {description}")]
    UnexpectedErrorKind { description: String },

    #[error("subscription path {path} needs an interface but none was selected")]
    InterfaceRequired { path: String },

    #[error("{path} is not a leaf and cannot be toggled")]
    NotALeaf { path: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

fn key_list(set: &OutcomeSet) -> String {
    set.keys()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
