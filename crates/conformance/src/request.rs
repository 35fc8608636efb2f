use gnmi_primitives::subscription::{Mode, SpecError, SubscriptionSpec};
use gnmi_primitives::wire::{SubscribeRequest, Subscription};

/// Builds the single-subscription request for `spec`.
///
/// The spec is validated first; an inconsistent spec never reaches the wire.
pub fn build(spec: &SubscriptionSpec, target: &str) -> Result<SubscribeRequest, SpecError> {
    spec.validate()?;

    let sub_mode = spec.sub_mode.filter(|_| spec.mode == Mode::Stream);
    let sample_interval_ns = spec
        .is_sample()
        .then(|| nanos(spec.sample_interval.as_nanos()));

    Ok(SubscribeRequest {
        target: target.to_owned(),
        subscriptions: vec![Subscription {
            path: spec.path.clone(),
            sub_mode,
            sample_interval_ns,
            suppress_redundant: spec.suppress_redundant,
            heartbeat_interval_ns: nanos(spec.heartbeat_interval.as_nanos()),
        }],
        mode: spec.mode,
        updates_only: spec.updates_only,
    })
}

fn nanos(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
