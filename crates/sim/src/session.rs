//! Device side of one subscribe stream.

use core::fmt::Display;
use core::time::Duration;
use std::collections::BTreeMap;
use std::sync::Arc;

use eyre::{Result as EyreResult, WrapErr};
use gnmi_primitives::path;
use gnmi_primitives::subscription::{Mode, SubMode};
use gnmi_primitives::wire::{ClientMessage, ServerMessage, SubscribeRequest, Subscription};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::config::SimConfig;
use crate::state::{Change, StateStore};
use crate::stream::DeviceEnd;

const INVALID_ARGUMENT: &str = "InvalidArgument";
const NOT_FOUND: &str = "NotFound";
const RESOURCE_EXHAUSTED: &str = "ResourceExhausted";

fn status(code: &str, description: impl Display) -> ServerMessage {
    ServerMessage::error(format!("rpc error: code = {code} desc = {description}"))
}

fn invalid(description: impl Display) -> ServerMessage {
    status(INVALID_ARGUMENT, description)
}

/// Leaf path to the value last put on the wire.
type Delivered = BTreeMap<String, String>;

pub(crate) struct Session {
    store: Arc<StateStore>,
    config: Arc<SimConfig>,
    end: DeviceEnd,
}

impl Session {
    pub(crate) const fn new(store: Arc<StateStore>, config: Arc<SimConfig>, end: DeviceEnd) -> Self {
        Self { store, config, end }
    }

    /// Serves the stream until the client goes away, the subscription
    /// completes, or it is rejected.
    pub(crate) async fn serve(mut self) -> EyreResult<()> {
        let Some(first) = self.end.requests.recv().await else {
            return Ok(());
        };

        let ClientMessage::Subscribe(request) = first else {
            return self.send(invalid("first message must be a subscribe request")).await;
        };

        if self.config.faults.silent {
            debug!("silent, swallowing subscription");
            while self.end.requests.recv().await.is_some() {}
            return Ok(());
        }

        if let Some(description) = self.config.faults.reject_with.clone() {
            return self.send(ServerMessage::error(description)).await;
        }

        let subscription = match self.validate(&request) {
            Ok(subscription) => subscription,
            Err(rejection) => {
                debug!(?rejection, "subscription rejected");
                return self.send(rejection).await;
            }
        };

        debug!(path = %subscription.path, mode = ?request.mode, "subscription accepted");

        let withheld = request.updates_only && !self.config.faults.leak_updates_only;
        match request.mode {
            Mode::Once => {
                if !withheld {
                    let _delivered = self.dump(&subscription.path).await?;
                }
                self.sync().await
            }
            Mode::Poll => self.poll(&subscription.path, withheld).await,
            Mode::Stream => self.stream(&subscription, withheld).await,
        }
    }

    fn validate(&self, request: &SubscribeRequest) -> Result<Subscription, ServerMessage> {
        let [subscription] = request.subscriptions.as_slice() else {
            return Err(invalid("exactly one subscription per request is supported"));
        };

        if self.store.read(&subscription.path).is_none() {
            return Err(status(NOT_FOUND, format_args!("no state at {}", subscription.path)));
        }

        let sampled = request.mode == Mode::Stream && subscription.sub_mode == Some(SubMode::Sample);

        if request.mode == Mode::Stream && subscription.sub_mode.is_none() {
            return Err(invalid("STREAM subscription without a sub-mode"));
        }

        match (sampled, subscription.sample_interval_ns) {
            (true, None) => return Err(invalid("SAMPLE subscription without a sample interval")),
            (true, Some(ns)) if Duration::from_nanos(ns) < self.config.min_sample_interval => {
                return Err(invalid(format_args!(
                    "sample interval {ns}ns is below the minimum of {:?}",
                    self.config.min_sample_interval
                )));
            }
            (false, Some(_)) => {
                return Err(invalid("sample interval is only valid for SAMPLE subscriptions"));
            }
            _ => {}
        }

        if request.mode != Mode::Stream && subscription.heartbeat_interval_ns > 0 {
            return Err(invalid("heartbeat interval requires a STREAM subscription"));
        }

        if request.mode == Mode::Stream && subscription.sub_mode == Some(SubMode::OnChange) {
            let unsupported = self.store.leaves(&subscription.path).into_iter().find(|(leaf, _)| {
                self.config
                    .on_change_unsupported
                    .iter()
                    .any(|fragment| leaf.contains(fragment.as_str()))
            });

            if let Some((leaf, _)) = unsupported {
                return Err(invalid(format_args!("{leaf} does not support ON_CHANGE")));
            }
        }

        Ok(subscription.clone())
    }

    async fn poll(&mut self, path: &str, withheld: bool) -> EyreResult<()> {
        let mut first = true;

        while let Some(message) = self.end.requests.recv().await {
            match message {
                ClientMessage::Poll => {
                    trace!(first, "poll");
                    if !(first && withheld) {
                        let _delivered = self.dump(path).await?;
                    }
                    first = false;
                    self.sync().await?;
                }
                ClientMessage::Subscribe(_) => {
                    return self.send(invalid("duplicate subscribe request")).await;
                }
            }
        }

        Ok(())
    }

    async fn stream(&mut self, subscription: &Subscription, withheld: bool) -> EyreResult<()> {
        let path = subscription.path.as_str();
        let sampled = subscription.sub_mode == Some(SubMode::Sample);
        let suppress = subscription.suppress_redundant && !self.config.faults.ignore_suppress;
        let push_updates = !sampled && !self.config.faults.drop_on_change;

        // Subscribe before the dump so no change can slip in between.
        let mut changes = self.store.subscribe();

        let mut delivered = if withheld {
            Delivered::new()
        } else {
            self.dump(path).await?
        };
        self.sync().await?;

        let mut sample = subscription
            .sample_interval_ns
            .filter(|_| sampled)
            .map(|ns| timer(Duration::from_nanos(ns) + self.config.faults.sample_delay));

        let mut heartbeat = (subscription.heartbeat_interval_ns > 0).then(|| {
            timer(Duration::from_nanos(subscription.heartbeat_interval_ns) + self.config.faults.heartbeat_delay)
        });

        loop {
            tokio::select! {
                message = self.end.requests.recv() => match message {
                    None => return Ok(()),
                    Some(ClientMessage::Poll) => {
                        return self.send(invalid("poll trigger on a STREAM subscription")).await;
                    }
                    Some(ClientMessage::Subscribe(_)) => {
                        return self.send(invalid("duplicate subscribe request")).await;
                    }
                },
                change = changes.recv() => match change {
                    Ok(change) => self.forward(change, path, push_updates, &mut delivered).await?,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change feed lagged, failing the stream");
                        let message = status(
                            RESOURCE_EXHAUSTED,
                            format_args!("{skipped} state changes lost, raise changeCapacity"),
                        );
                        return self.send(message).await;
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
                () = next_tick(&mut sample) => {
                    for (leaf, value) in self.store.leaves(path) {
                        if suppress && delivered.get(&leaf) == Some(&value) {
                            continue;
                        }
                        self.send(self.update(&leaf, &value)).await?;
                        drop(delivered.insert(leaf, value));
                    }
                },
                () = next_tick(&mut heartbeat) => {
                    trace!("heartbeat");
                    delivered = self.dump(path).await?;
                },
            }
        }
    }

    /// Relays a state change that touches the subscribed path.
    async fn forward(&self, change: Change, path: &str, push_updates: bool, delivered: &mut Delivered) -> EyreResult<()> {
        match change {
            Change::Updated { path: leaf, value } => {
                if !push_updates || !path::is_within(path, &leaf) {
                    return Ok(());
                }

                self.send(self.update(&leaf, &value)).await?;
                drop(delivered.insert(leaf, value));
            }
            Change::Deleted { root, leaves } => {
                let affected: Vec<String> = leaves.into_iter().filter(|leaf| path::is_within(path, leaf)).collect();
                if affected.is_empty() {
                    return Ok(());
                }

                if self.config.faults.collapse_subtree_deletes {
                    let notice = if path::is_within(path, &root) { root } else { path.to_owned() };
                    self.send(ServerMessage::delete(notice)).await?;
                } else {
                    for leaf in &affected {
                        self.send(ServerMessage::delete(leaf.as_str())).await?;
                    }
                }

                delivered.retain(|leaf, _| !affected.contains(leaf));
            }
        }

        Ok(())
    }

    /// Sends every leaf under `path` and returns what was sent.
    async fn dump(&self, path: &str) -> EyreResult<Delivered> {
        let leaves: Delivered = self.store.leaves(path).into_iter().collect();
        for (leaf, value) in &leaves {
            self.send(self.update(leaf, value)).await?;
        }
        Ok(leaves)
    }

    async fn sync(&self) -> EyreResult<()> {
        if self.config.faults.drop_sync {
            debug!("dropping sync");
            return Ok(());
        }

        self.send(ServerMessage::SyncComplete).await
    }

    fn update(&self, leaf: &str, value: &str) -> ServerMessage {
        if self.config.faults.corrupt_value.as_deref() == Some(leaf) {
            return ServerMessage::update(leaf, format!("{value}-corrupted"));
        }

        ServerMessage::update(leaf, value)
    }

    async fn send(&self, message: ServerMessage) -> EyreResult<()> {
        self.end
            .responses
            .send(message)
            .await
            .wrap_err("client hung up")
    }
}

fn timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            let _instant = timer.tick().await;
        }
        None => core::future::pending().await,
    }
}
