use core::fmt::{self, Display, Formatter};
use core::time::Duration;

use gnmi_primitives::subscription::SubscriptionSpec;
use thiserror::Error;

/// Which configured interval bounds a no-change delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    Heartbeat(Duration),
    Sample(Duration),
}

impl Cadence {
    #[must_use]
    pub const fn interval(self) -> Duration {
        match self {
            Self::Heartbeat(interval) | Self::Sample(interval) => interval,
        }
    }
}

impl Display for Cadence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heartbeat(interval) => write!(f, "heartbeat interval {interval:?}"),
            Self::Sample(interval) => write!(f, "sample interval {interval:?}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("delivery after {measured:?} violates {cadence} (allowed up to {allowed:?})")]
pub struct TimingViolation {
    pub cadence: Cadence,
    pub measured: Duration,
    pub allowed: Duration,
}

/// Checks repeated-delivery delays against the subscription's cadence.
///
/// A heartbeat takes precedence over the sample interval. Subscriptions with
/// neither (plain on-change, server-defined) are unconstrained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingMonitor {
    cadence: Option<Cadence>,
}

impl TimingMonitor {
    #[must_use]
    pub fn for_spec(spec: &SubscriptionSpec) -> Self {
        let cadence = if !spec.heartbeat_interval.is_zero() {
            Some(Cadence::Heartbeat(spec.heartbeat_interval))
        } else if spec.is_sample() && !spec.sample_interval.is_zero() {
            Some(Cadence::Sample(spec.sample_interval))
        } else {
            None
        };

        Self { cadence }
    }

    #[must_use]
    pub const fn cadence(&self) -> Option<Cadence> {
        self.cadence
    }

    /// Upper bound on the delay: the interval plus half of it again.
    #[must_use]
    pub fn allowed(interval: Duration) -> Duration {
        interval.saturating_add(interval / 2)
    }

    /// `0 < measured <= 1.5 × interval`.
    pub fn check(&self, measured: Duration) -> Result<(), TimingViolation> {
        let Some(cadence) = self.cadence else {
            return Ok(());
        };

        let allowed = Self::allowed(cadence.interval());
        if measured.is_zero() || measured > allowed {
            return Err(TimingViolation {
                cadence,
                measured,
                allowed,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};
    use gnmi_primitives::subscription::SubMode;

    use super::*;

    const DEADLINE: Duration = Duration::from_secs(5);

    fn on_change_with_heartbeat(heartbeat: Duration) -> SubscriptionSpec {
        SubscriptionSpec::stream("/mtu", SubMode::OnChange, DEADLINE).with_heartbeat(heartbeat)
    }

    #[test]
    fn heartbeat_bound_is_one_and_a_half_intervals() {
        let monitor = TimingMonitor::for_spec(&on_change_with_heartbeat(Duration::from_secs(2)));

        assert_ok!(monitor.check(Duration::from_millis(2_100)));
        assert_ok!(monitor.check(Duration::from_secs(3)));

        let violation = assert_err!(monitor.check(Duration::from_millis(3_001)));
        assert_eq!(violation.allowed, Duration::from_secs(3), "1.5 x 2s");
        assert_eq!(violation.cadence, Cadence::Heartbeat(Duration::from_secs(2)), "heartbeat cadence");
    }

    #[test]
    fn zero_delay_is_rejected() {
        let monitor = TimingMonitor::for_spec(&on_change_with_heartbeat(Duration::from_secs(2)));
        assert_err!(monitor.check(Duration::ZERO));
    }

    #[test]
    fn heartbeat_takes_precedence_over_sample() {
        let spec = SubscriptionSpec::stream("/system/state", SubMode::Sample, DEADLINE)
            .with_sample_interval(Duration::from_secs(2))
            .with_heartbeat(Duration::from_secs(3));

        assert_eq!(
            TimingMonitor::for_spec(&spec).cadence(),
            Some(Cadence::Heartbeat(Duration::from_secs(3))),
            "heartbeat wins"
        );
    }

    #[test]
    fn sample_interval_bounds_sampled_delivery() {
        let spec = SubscriptionSpec::stream("/system/state", SubMode::Sample, DEADLINE)
            .with_sample_interval(Duration::from_secs(2));
        let monitor = TimingMonitor::for_spec(&spec);

        assert_ok!(monitor.check(Duration::from_secs(2)));
        assert_err!(monitor.check(Duration::from_millis(3_500)));
    }

    #[test]
    fn plain_on_change_is_unconstrained() {
        let spec = SubscriptionSpec::stream("/mtu", SubMode::OnChange, DEADLINE);
        let monitor = TimingMonitor::for_spec(&spec);

        assert_eq!(monitor.cadence(), None, "no cadence");
        assert_ok!(monitor.check(Duration::from_secs(60)));
    }
}
