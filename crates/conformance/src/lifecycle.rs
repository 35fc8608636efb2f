//! Per-scenario protocol state.
//!
//! ```text
//! Init -> RequestSent -> AwaitingSync -> Synced -> (AwaitingMutationEcho -> Verified)* -> Done
//! ```
//!
//! `Errored` is reachable from every non-terminal state, on an error status
//! or an expired deadline. `Done` and `Errored` are terminal.

use core::fmt::{self, Display, Formatter};

use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioState {
    Init,
    RequestSent,
    AwaitingSync,
    Synced,
    AwaitingMutationEcho,
    Verified,
    Done,
    Errored,
}

impl ScenarioState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }

    const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::RequestSent)
                | (Self::RequestSent, Self::AwaitingSync)
                | (Self::AwaitingSync, Self::Synced)
                | (Self::Synced | Self::Verified, Self::AwaitingMutationEcho | Self::Done)
                | (Self::AwaitingMutationEcho, Self::Verified)
        )
    }
}

impl Display for ScenarioState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "INIT",
            Self::RequestSent => "REQUEST_SENT",
            Self::AwaitingSync => "AWAITING_SYNC",
            Self::Synced => "SYNCED",
            Self::AwaitingMutationEcho => "AWAITING_MUTATION_ECHO",
            Self::Verified => "VERIFIED",
            Self::Done => "DONE",
            Self::Errored => "ERRORED",
        })
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("illegal scenario transition {from} -> {to}")]
pub struct LifecycleError {
    pub from: ScenarioState,
    pub to: ScenarioState,
}

#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    state: ScenarioState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ScenarioState::Init,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn advance(&mut self, next: ScenarioState) -> Result<(), LifecycleError> {
        if !self.state.can_advance_to(next) {
            return Err(LifecycleError {
                from: self.state,
                to: next,
            });
        }

        debug!(from = %self.state, to = %next, "scenario transition");
        self.state = next;
        Ok(())
    }

    /// Moves to `Errored`. A no-op once terminal.
    pub fn fail(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        debug!(from = %self.state, "scenario errored");
        self.state = ScenarioState::Errored;
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};

    use super::ScenarioState::*;
    use super::*;

    #[test]
    fn full_walk_with_two_echo_rounds() {
        let mut lifecycle = Lifecycle::new();

        for next in [
            RequestSent,
            AwaitingSync,
            Synced,
            AwaitingMutationEcho,
            Verified,
            AwaitingMutationEcho,
            Verified,
            Done,
        ] {
            assert_ok!(lifecycle.advance(next));
        }

        assert!(lifecycle.state().is_terminal(), "done is terminal");
    }

    #[test]
    fn sync_cannot_be_skipped() {
        let mut lifecycle = Lifecycle::new();
        assert_ok!(lifecycle.advance(RequestSent));

        let error = assert_err!(lifecycle.advance(Synced));
        assert_eq!(error, LifecycleError { from: RequestSent, to: Synced }, "rejected");
        assert_eq!(lifecycle.state(), RequestSent, "state unchanged");
    }

    #[test]
    fn errored_is_reachable_until_done() {
        let mut lifecycle = Lifecycle::new();
        assert_ok!(lifecycle.advance(RequestSent));
        lifecycle.fail();
        assert_eq!(lifecycle.state(), Errored, "failed mid-flight");
        assert_err!(lifecycle.advance(AwaitingSync));

        let mut finished = Lifecycle::new();
        for next in [RequestSent, AwaitingSync, Synced, Done] {
            assert_ok!(finished.advance(next));
        }
        finished.fail();
        assert_eq!(finished.state(), Done, "terminal states stick");
    }
}
