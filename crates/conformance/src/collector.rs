//! Reading one collection phase off a subscribe stream.

use core::fmt::{self, Display, Formatter};
use core::time::Duration;

use gnmi_primitives::subscription::Mode;
use gnmi_primitives::transport::{SubscribeStream, TransportError};
use gnmi_primitives::wire::{ClientMessage, ServerMessage};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use crate::exclusions::VolatileExclusionList;
use crate::outcome::{Outcome, OutcomeRecord, OutcomeSet};

/// What ends a phase successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Until {
    /// The sync sentinel arrived.
    Sync,
    /// Every expected record has been observed with its expected state.
    Coverage,
    /// The window elapsed; used to assert silence.
    Window,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Synced,
    Covered,
    WindowElapsed,
    Errored,
    Closed,
    DeadlineExceeded,
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Synced => "synced",
            Self::Covered => "covered",
            Self::WindowElapsed => "window elapsed",
            Self::Errored => "error status",
            Self::Closed => "stream closed",
            Self::DeadlineExceeded => "deadline exceeded",
        })
    }
}

#[derive(Clone, Debug)]
pub struct Collection {
    pub observed: OutcomeSet,
    /// From the start of the read loop to the terminating event.
    pub elapsed: Duration,
    pub termination: Termination,
}

/// Drives reads on an open stream and classifies every message.
#[derive(Debug)]
pub struct StreamCollector<'a, S> {
    stream: &'a mut S,
    exclusions: &'a VolatileExclusionList,
    mode: Mode,
}

impl<'a, S: SubscribeStream> StreamCollector<'a, S> {
    pub fn new(stream: &'a mut S, exclusions: &'a VolatileExclusionList, mode: Mode) -> Self {
        Self {
            stream,
            exclusions,
            mode,
        }
    }

    /// Reads until `until` is satisfied, an error status arrives, the peer
    /// closes, or `budget` runs out.
    ///
    /// POLL subscriptions get a poll trigger before reading. Only transport
    /// failures are returned as `Err`; every protocol-level ending is a
    /// [`Termination`].
    pub async fn collect(
        &mut self,
        expected: &OutcomeSet,
        until: Until,
        budget: Duration,
    ) -> Result<Collection, TransportError> {
        if self.mode == Mode::Poll {
            self.stream.send(&ClientMessage::Poll).await?;
        }

        let started = Instant::now();
        let deadline = started + budget;
        let mut observed = OutcomeSet::new();

        let termination = loop {
            let Ok(received) = timeout_at(deadline, self.stream.recv()).await else {
                break if until == Until::Window {
                    Termination::WindowElapsed
                } else {
                    Termination::DeadlineExceeded
                };
            };

            let Some(message) = received? else {
                break Termination::Closed;
            };

            match message {
                ServerMessage::Update { path, value } => {
                    self.record(&mut observed, expected, path, OutcomeRecord::value(value));
                }
                ServerMessage::Delete { path } => {
                    self.record_delete(&mut observed, expected, path);
                }
                ServerMessage::SyncComplete => {
                    trace!("sync complete");
                    observed.record(Outcome::Sync);
                    if until == Until::Sync {
                        break Termination::Synced;
                    }
                }
                ServerMessage::ErrorStatus { description } => {
                    debug!(%description, "error status on stream");
                    observed.record(Outcome::Error { description });
                    break Termination::Errored;
                }
            }

            if until == Until::Coverage && expected.is_covered_by(&observed) {
                break Termination::Covered;
            }
        };

        let elapsed = match termination {
            Termination::DeadlineExceeded | Termination::WindowElapsed => budget,
            _ => started.elapsed(),
        };

        debug!(%termination, ?elapsed, observed = observed.len(), "collection finished");

        Ok(Collection {
            observed,
            elapsed,
            termination,
        })
    }

    fn record(&self, observed: &mut OutcomeSet, expected: &OutcomeSet, path: String, mut record: OutcomeRecord) {
        if self.exclusions.is_excluded(&path) {
            trace!(%path, "dropping volatile path");
            return;
        }

        record.matched = expected.contains_path(&path);
        trace!(%path, state = %record.state, "recorded");
        observed.record(Outcome::Data { path, record });
    }

    /// A delete notice for an ancestor of expected paths stands for all of
    /// them.
    fn record_delete(&self, observed: &mut OutcomeSet, expected: &OutcomeSet, path: String) {
        if expected.contains_path(&path) {
            self.record(observed, expected, path, OutcomeRecord::deleted());
            return;
        }

        let descendants: Vec<String> = expected.paths_within(&path).map(str::to_owned).collect();
        if descendants.is_empty() {
            self.record(observed, expected, path, OutcomeRecord::deleted());
            return;
        }

        debug!(%path, count = descendants.len(), "expanding subtree delete");
        for descendant in descendants {
            self.record(observed, expected, descendant, OutcomeRecord::deleted());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use tokio::time::sleep;

    use super::*;

    /// Replays a script of `(delay, message)`; `None` closes the stream.
    #[derive(Debug, Default)]
    struct ScriptedStream {
        script: VecDeque<(Duration, Option<ServerMessage>)>,
        sent: Vec<ClientMessage>,
    }

    impl ScriptedStream {
        fn after(mut self, delay: Duration, message: ServerMessage) -> Self {
            self.script.push_back((delay, Some(message)));
            self
        }

        fn then(self, message: ServerMessage) -> Self {
            self.after(Duration::ZERO, message)
        }

        fn then_close(mut self) -> Self {
            self.script.push_back((Duration::ZERO, None));
            self
        }
    }

    #[async_trait]
    impl SubscribeStream for ScriptedStream {
        async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
            self.sent.push(message.clone());
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<ServerMessage>, TransportError> {
            let Some((delay, _)) = self.script.front() else {
                return std::future::pending().await;
            };
            sleep(*delay).await;
            Ok(self.script.pop_front().and_then(|(_, message)| message))
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    const BUDGET: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn initial_phase_ends_at_sync() {
        let mut stream = ScriptedStream::default()
            .then(ServerMessage::update("/system/state/hostname", "sw1"))
            .then(ServerMessage::SyncComplete)
            .then(ServerMessage::update("/system/state/hostname", "late"));
        let exclusions = VolatileExclusionList::default();
        let expected = OutcomeSet::new().with_value("/system/state/hostname", "sw1").with_sync();

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Stream)
            .collect(&expected, Until::Sync, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(collection.termination, Termination::Synced, "sync terminates");
        assert_eq!(collection.observed, expected, "late update not read");
        assert_eq!(stream.script.len(), 1, "stream left open for later phases");
    }

    #[tokio::test(start_paused = true)]
    async fn later_update_supersedes_earlier_and_volatile_paths_are_dropped() {
        let mut stream = ScriptedStream::default()
            .then(ServerMessage::update("/mtu", "1500"))
            .then(ServerMessage::update("/system/state/uptime", "17"))
            .then(ServerMessage::update("/mtu", "9000"))
            .then(ServerMessage::SyncComplete);
        let exclusions = VolatileExclusionList::default();

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Stream)
            .collect(&OutcomeSet::new(), Until::Sync, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(
            collection.observed,
            OutcomeSet::new().with_value("/mtu", "9000").with_sync(),
            "last write wins, uptime ignored"
        );
        assert!(!collection.observed.data()["/mtu"].matched, "not expected, so unmatched");
    }

    #[tokio::test(start_paused = true)]
    async fn error_status_stops_reading_immediately() {
        let mut stream = ScriptedStream::default()
            .after(Duration::from_millis(20), ServerMessage::error("code = InvalidArgument"))
            .then(ServerMessage::SyncComplete);
        let exclusions = VolatileExclusionList::default();

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Stream)
            .collect(&OutcomeSet::new(), Until::Sync, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(collection.termination, Termination::Errored, "error terminates");
        assert_eq!(collection.observed.error(), Some("code = InvalidArgument"), "description kept");
        assert!(!collection.observed.has_sync(), "nothing read after the error");
        assert_eq!(collection.elapsed, Duration::from_millis(20), "elapsed to the error");
    }

    #[tokio::test(start_paused = true)]
    async fn silence_runs_into_the_deadline() {
        let mut stream = ScriptedStream::default().then(ServerMessage::update("/hostname", "sw1"));
        let exclusions = VolatileExclusionList::default();

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Once)
            .collect(&OutcomeSet::new().with_sync(), Until::Sync, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(collection.termination, Termination::DeadlineExceeded, "no sync in time");
        assert_eq!(collection.elapsed, BUDGET, "full budget used");
        assert_eq!(collection.observed.len(), 1, "partial set kept for diagnosis");
    }

    #[tokio::test(start_paused = true)]
    async fn peer_close_is_reported() {
        let mut stream = ScriptedStream::default().then_close();
        let exclusions = VolatileExclusionList::default();

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Once)
            .collect(&OutcomeSet::new().with_sync(), Until::Sync, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(collection.termination, Termination::Closed, "EOF");
    }

    #[tokio::test(start_paused = true)]
    async fn poll_mode_triggers_before_reading() {
        let mut stream = ScriptedStream::default().then(ServerMessage::SyncComplete);
        let exclusions = VolatileExclusionList::default();

        let _collection = StreamCollector::new(&mut stream, &exclusions, Mode::Poll)
            .collect(&OutcomeSet::new().with_sync(), Until::Sync, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(stream.sent, vec![ClientMessage::Poll], "one poll trigger");
    }

    #[tokio::test(start_paused = true)]
    async fn coverage_waits_for_the_expected_value() {
        let mut stream = ScriptedStream::default()
            .after(Duration::from_millis(100), ServerMessage::update("/mtu", "1500"))
            .after(Duration::from_millis(400), ServerMessage::update("/mtu", "9000"))
            .then(ServerMessage::update("/mtu", "never read"));
        let exclusions = VolatileExclusionList::default();
        let expected = OutcomeSet::new().with_value("/mtu", "9000");

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Stream)
            .collect(&expected, Until::Coverage, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(collection.termination, Termination::Covered, "covered");
        assert_eq!(collection.elapsed, Duration::from_millis(500), "stale value did not end the phase");
        assert!(collection.observed.data()["/mtu"].matched, "expected key is matched");
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_window_elapses_without_failure() {
        let mut stream = ScriptedStream::default()
            .after(Duration::from_millis(500), ServerMessage::update("/system/state/uptime", "18"));
        let exclusions = VolatileExclusionList::default();
        let window = Duration::from_secs(3);

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Stream)
            .collect(&OutcomeSet::new(), Until::Window, window)
            .await
            .expect("no transport failure");

        assert_eq!(collection.termination, Termination::WindowElapsed, "window");
        assert!(collection.observed.is_empty(), "volatile noise filtered");
        assert_eq!(collection.elapsed, window, "whole window");
    }

    #[tokio::test(start_paused = true)]
    async fn subtree_delete_expands_to_expected_descendants() {
        let mut stream = ScriptedStream::default().then(ServerMessage::delete("/system/config"));
        let exclusions = VolatileExclusionList::default();
        let expected = OutcomeSet::new()
            .with_deleted("/system/config/hostname")
            .with_deleted("/system/config/domain-name");

        let collection = StreamCollector::new(&mut stream, &exclusions, Mode::Stream)
            .collect(&expected, Until::Coverage, BUDGET)
            .await
            .expect("no transport failure");

        assert_eq!(collection.termination, Termination::Covered, "one notice covers the subtree");
        assert_eq!(collection.observed, expected, "expanded");
    }
}
