//! One generic runner for every scenario in the catalog.

use core::time::Duration;

use gnmi_primitives::subscription::SubscriptionSpec;
use gnmi_primitives::transport::{Mutator, SnapshotAccessor, SubscribeStream, Transport};
use gnmi_primitives::tree;
use gnmi_primitives::wire::ClientMessage;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::catalog::{default_skip_list, SUITE};
use crate::collector::{Collection, StreamCollector, Termination, Until};
use crate::error::{Phase, ScenarioError};
use crate::exclusions::{SkipList, VolatileExclusionList};
use crate::expected::{self, INVALID_ARGUMENT_MARKER};
use crate::flatten::{FlatSnapshot, StateSnapshotFlattener};
use crate::lifecycle::{Lifecycle, ScenarioState};
use crate::outcome::OutcomeSet;
use crate::report::{PhaseReport, ScenarioReport, Verdict};
use crate::request;
use crate::scenario::{Scenario, ScenarioKind};
use crate::timing::TimingMonitor;
use crate::verify::verify;

/// Read-only configuration shared by every scenario of a run.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub suite: String,
    pub exclusions: VolatileExclusionList,
    pub skip_list: SkipList,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            suite: SUITE.to_owned(),
            exclusions: VolatileExclusionList::default(),
            skip_list: default_skip_list(),
        }
    }
}

/// The device under test, seen through its collaborators.
#[derive(Debug)]
pub struct Target<'a, T, A, M> {
    pub name: &'a str,
    pub transport: &'a T,
    pub snapshots: &'a A,
    pub mutator: &'a M,
}

impl<T, A, M> Clone for Target<'_, T, A, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A, M> Copy for Target<'_, T, A, M> {}

#[derive(Debug)]
pub struct ScenarioRunner<'a, T, A, M> {
    config: RunnerConfig,
    target: Target<'a, T, A, M>,
}

impl<'a, T, A, M> ScenarioRunner<'a, T, A, M>
where
    T: Transport,
    A: SnapshotAccessor,
    M: Mutator,
{
    pub const fn new(config: RunnerConfig, target: Target<'a, T, A, M>) -> Self {
        Self { config, target }
    }

    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs `scenario` to completion. Failures are captured in the report,
    /// never propagated.
    pub async fn run(&self, scenario: &Scenario, interface: Option<&str>) -> ScenarioReport {
        let span = info_span!("scenario", name = %scenario.name, uuid = %scenario.uuid);

        async move {
            if self.config.skip_list.contains(&self.config.suite, &scenario.name) {
                info!("skipped, known broken");
                return ScenarioReport {
                    name: scenario.name.clone(),
                    uuid: scenario.uuid.clone(),
                    verdict: Verdict::Skipped,
                    phases: Vec::new(),
                };
            }

            let mut run = Run {
                target: self.target,
                exclusions: &self.config.exclusions,
                lifecycle: Lifecycle::new(),
                phases: Vec::new(),
                restores: Vec::new(),
            };

            let outcome = run.execute(scenario, interface).await;
            run.restore().await;

            let verdict = match outcome {
                Ok(()) => {
                    info!(phases = run.phases.len(), "passed");
                    Verdict::Passed
                }
                Err(error) => {
                    warn!(%error, state = %run.lifecycle.state(), "failed");
                    Verdict::Failed(error)
                }
            };

            ScenarioReport {
                name: scenario.name.clone(),
                uuid: scenario.uuid.clone(),
                verdict,
                phases: run.phases,
            }
        }
        .instrument(span)
        .await
    }
}

/// Scenario-local state of a single run.
struct Run<'r, T, A, M> {
    target: Target<'r, T, A, M>,
    exclusions: &'r VolatileExclusionList,
    lifecycle: Lifecycle,
    phases: Vec<PhaseReport>,
    /// Leaves to write back once the scenario is over.
    restores: Vec<(String, String)>,
}

impl<T, A, M> Run<'_, T, A, M>
where
    T: Transport,
    A: SnapshotAccessor,
    M: Mutator,
{
    async fn execute(&mut self, scenario: &Scenario, interface: Option<&str>) -> Result<(), ScenarioError> {
        let spec = scenario.resolve(interface);
        if spec.needs_interface() {
            return Err(ScenarioError::InterfaceRequired { path: spec.path });
        }

        let request = request::build(&spec, self.target.name)?;
        match serde_json::to_string_pretty(&request) {
            Ok(text) => info!("subscribe request:\n{text}"),
            Err(error) => debug!(%error, ?request, "subscribe request not renderable"),
        }

        let mut stream = self.target.transport.open_stream(self.target.name).await?;

        let result = self.drive(&mut stream, scenario.kind, &spec, ClientMessage::Subscribe(request)).await;
        if result.is_err() {
            self.lifecycle.fail();
        }

        if let Err(error) = stream.close().await {
            debug!(%error, "stream close failed");
        }

        result
    }

    async fn drive(
        &mut self,
        stream: &mut T::Stream,
        kind: ScenarioKind,
        spec: &SubscriptionSpec,
        request: ClientMessage,
    ) -> Result<(), ScenarioError> {
        stream.send(&request).await?;
        self.lifecycle.advance(ScenarioState::RequestSent)?;

        let known = if spec.expect_protocol_error {
            FlatSnapshot::new()
        } else {
            self.snapshot(&spec.path).await?
        };
        let initial = expected::initial(spec, Some(&known));

        self.lifecycle.advance(ScenarioState::AwaitingSync)?;
        let collection = self.collect(stream, spec, Phase::Initial, &initial, Until::Sync, spec.deadline).await?;

        if spec.expect_protocol_error {
            return self.expect_rejection(collection.termination, &collection.observed);
        }

        expect_termination(Phase::Initial, collection.termination, Termination::Synced, &collection.observed)?;
        verify(&initial, &collection.observed).map_err(|diff| ScenarioError::Mismatch {
            phase: Phase::Initial,
            diff,
        })?;
        self.lifecycle.advance(ScenarioState::Synced)?;

        let monitor = TimingMonitor::for_spec(spec);

        match kind {
            ScenarioKind::OnChange => {
                if !spec.heartbeat_interval.is_zero() {
                    let unchanged = self.snapshot(&spec.path).await?;
                    let expected = expected::redelivery(&unchanged);
                    self.follow_up(stream, spec, Phase::Redelivery, &expected, Until::Coverage, spec.deadline, Some(&monitor))
                        .await?;
                }

                let (path, value) = self.toggle(&spec.path).await?;
                let expected = expected::mutation(&path, &value);
                self.follow_up(stream, spec, Phase::MutationEcho, &expected, Until::Coverage, spec.deadline, None)
                    .await?;
            }
            ScenarioKind::Poll => {
                let fresh = self.snapshot(&spec.path).await?;
                let expected = expected::poll_response(&fresh);
                self.follow_up(stream, spec, Phase::Poll, &expected, Until::Sync, spec.deadline, None)
                    .await?;
            }
            ScenarioKind::Sample if spec.is_sample() => {
                let fresh = self.snapshot(&spec.path).await?;
                let expected = expected::redelivery(&fresh);
                self.follow_up(stream, spec, Phase::Redelivery, &expected, Until::Coverage, spec.deadline, Some(&monitor))
                    .await?;
            }
            ScenarioKind::Delete => {
                self.target.mutator.delete_path(&spec.path).await?;
                self.restores
                    .extend(known.iter().map(|(path, value)| (path.clone(), value.clone())));
                info!(path = %spec.path, leaves = known.len(), "deleted subscribed state");

                let expected = expected::deletion(&spec.path, &known);
                self.follow_up(stream, spec, Phase::DeletionEcho, &expected, Until::Coverage, spec.deadline, None)
                    .await?;
            }
            ScenarioKind::Suppress if !spec.heartbeat_interval.is_zero() => {
                let unchanged = self.snapshot(&spec.path).await?;
                let expected = expected::redelivery(&unchanged);
                self.follow_up(stream, spec, Phase::Redelivery, &expected, Until::Coverage, spec.deadline, Some(&monitor))
                    .await?;
            }
            ScenarioKind::Suppress if spec.is_sample() => {
                let window = TimingMonitor::allowed(spec.sample_interval);
                self.follow_up(stream, spec, Phase::QuietWindow, &OutcomeSet::new(), Until::Window, window, None)
                    .await?;
            }
            ScenarioKind::Sample
            | ScenarioKind::Suppress
            | ScenarioKind::Once
            | ScenarioKind::UpdatesOnly
            | ScenarioKind::Root => {}
        }

        self.lifecycle.advance(ScenarioState::Done)?;
        Ok(())
    }

    /// Success criterion of a scenario that sends a deliberately bad request.
    fn expect_rejection(&mut self, termination: Termination, observed: &OutcomeSet) -> Result<(), ScenarioError> {
        let (Termination::Errored, Some(description)) = (termination, observed.error()) else {
            return Err(ScenarioError::MissingError {
                observed: observed.clone(),
            });
        };

        self.lifecycle.fail();

        if !description.contains(INVALID_ARGUMENT_MARKER) {
            return Err(ScenarioError::UnexpectedErrorKind {
                description: description.to_owned(),
            });
        }

        info!(%description, "target rejected the request as expected");
        Ok(())
    }

    #[expect(clippy::too_many_arguments, reason = "one call site per phase kind")]
    async fn follow_up(
        &mut self,
        stream: &mut T::Stream,
        spec: &SubscriptionSpec,
        phase: Phase,
        expected: &OutcomeSet,
        until: Until,
        budget: Duration,
        monitor: Option<&TimingMonitor>,
    ) -> Result<(), ScenarioError> {
        self.lifecycle.advance(ScenarioState::AwaitingMutationEcho)?;

        let collection = self.collect(stream, spec, phase, expected, until, budget).await?;
        let success = match until {
            Until::Sync => Termination::Synced,
            Until::Coverage => Termination::Covered,
            Until::Window => Termination::WindowElapsed,
        };
        expect_termination(phase, collection.termination, success, &collection.observed)?;

        verify(expected, &collection.observed).map_err(|diff| ScenarioError::Mismatch { phase, diff })?;

        if let Some(monitor) = monitor {
            monitor
                .check(collection.elapsed)
                .map_err(|violation| ScenarioError::Timing { phase, violation })?;
        }

        self.lifecycle.advance(ScenarioState::Verified)?;
        Ok(())
    }

    async fn collect(
        &mut self,
        stream: &mut T::Stream,
        spec: &SubscriptionSpec,
        phase: Phase,
        expected: &OutcomeSet,
        until: Until,
        budget: Duration,
    ) -> Result<Collection, ScenarioError> {
        let collection = StreamCollector::new(stream, self.exclusions, spec.mode)
            .collect(expected, until, budget)
            .await?;

        info!(
            %phase,
            termination = %collection.termination,
            elapsed = ?collection.elapsed,
            observed = collection.observed.len(),
            "phase collected"
        );

        self.phases.push(PhaseReport {
            phase,
            elapsed: collection.elapsed,
            observed_keys: collection.observed.len(),
            termination: collection.termination,
        });

        Ok(collection)
    }

    async fn snapshot(&self, path: &str) -> Result<FlatSnapshot, ScenarioError> {
        let tree = self.target.snapshots.read_subtree(path).await?;
        Ok(StateSnapshotFlattener::new(self.exclusions).flatten(path, &tree))
    }

    /// Flips the MTU-style leaf at `path` between 1500 and 9000 and queues the
    /// old value for restoration.
    async fn toggle(&mut self, path: &str) -> Result<(String, String), ScenarioError> {
        let current = self.target.snapshots.read_subtree(path).await?;
        let Some(old) = tree::render_leaf(&current) else {
            return Err(ScenarioError::NotALeaf { path: path.to_owned() });
        };

        let new = if old == "1500" { "9000" } else { "1500" };
        self.target.mutator.write_leaf(path, new).await?;
        info!(%path, %old, %new, "mutated subscribed leaf");

        self.restores.push((path.to_owned(), old));
        Ok((path.to_owned(), new.to_owned()))
    }

    async fn restore(&mut self) {
        for (path, value) in self.restores.drain(..) {
            match self.target.mutator.write_leaf(&path, &value).await {
                Ok(()) => debug!(%path, %value, "restored"),
                Err(error) => warn!(%path, %error, "failed to restore"),
            }
        }
    }
}

fn expect_termination(
    phase: Phase,
    got: Termination,
    want: Termination,
    observed: &OutcomeSet,
) -> Result<(), ScenarioError> {
    if got == want {
        return Ok(());
    }

    Err(match got {
        Termination::Errored => ScenarioError::Protocol {
            phase,
            description: observed.error().unwrap_or_default().to_owned(),
        },
        Termination::Closed => ScenarioError::StreamClosed {
            phase,
            observed: observed.clone(),
        },
        Termination::Synced
        | Termination::Covered
        | Termination::WindowElapsed
        | Termination::DeadlineExceeded => ScenarioError::DeadlineExceeded {
            phase,
            observed: observed.clone(),
        },
    })
}
