use core::time::Duration;

use crate::collector::Termination;
use crate::error::{Phase, ScenarioError};

#[derive(Clone, Debug)]
pub enum Verdict {
    Passed,
    Skipped,
    Failed(ScenarioError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub elapsed: Duration,
    pub observed_keys: usize,
    pub termination: Termination,
}

#[derive(Clone, Debug)]
pub struct ScenarioReport {
    pub name: String,
    pub uuid: String,
    pub verdict: Verdict,
    pub phases: Vec<PhaseReport>,
}

impl ScenarioReport {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.verdict, Verdict::Passed)
    }

    #[must_use]
    pub const fn skipped(&self) -> bool {
        matches!(self.verdict, Verdict::Skipped)
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ScenarioError> {
        match &self.verdict {
            Verdict::Failed(error) => Some(error),
            Verdict::Passed | Verdict::Skipped => None,
        }
    }
}
