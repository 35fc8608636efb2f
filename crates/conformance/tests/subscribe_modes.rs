//! End-to-end runs of the built-in suite against the simulated target.

use core::time::Duration;

use claims::{assert_matches, assert_ok};
use gnmi_conformance::catalog::{subscribe_modes, KNOWN_BROKEN};
use gnmi_conformance::collector::Termination;
use gnmi_conformance::exclusions::SkipList;
use gnmi_conformance::outcome::OutcomeKey;
use gnmi_conformance::timing::Cadence;
use gnmi_conformance::{
    Deadlines, Phase, RunnerConfig, Scenario, ScenarioError, ScenarioReport, ScenarioRunner, Target,
};
use gnmi_primitives::transport::SnapshotAccessor;
use gnmi_sim::{SimConfig, SimDevice, SimFaults};
use serde_json::json;

const TARGET: &str = "dut";
const INTERFACE: &str = "Ethernet0";

fn scenario(name: &str) -> Scenario {
    subscribe_modes(&Deadlines::default())
        .into_iter()
        .find(|scenario| scenario.name == name)
        .expect("scenario is in the catalog")
}

fn faulty(faults: SimFaults) -> SimDevice {
    SimDevice::new(
        TARGET,
        SimConfig {
            faults,
            ..SimConfig::default()
        },
    )
}

fn unskipped() -> RunnerConfig {
    RunnerConfig {
        skip_list: SkipList::default(),
        ..RunnerConfig::default()
    }
}

async fn run_with(device: &SimDevice, config: RunnerConfig, name: &str) -> ScenarioReport {
    let target = Target {
        name: TARGET,
        transport: device,
        snapshots: device,
        mutator: device,
    };

    ScenarioRunner::new(config, target)
        .run(&scenario(name), Some(INTERFACE))
        .await
}

async fn run(device: &SimDevice, name: &str) -> ScenarioReport {
    run_with(device, RunnerConfig::default(), name).await
}

fn phases(report: &ScenarioReport) -> Vec<Phase> {
    report.phases.iter().map(|phase| phase.phase).collect()
}

#[tokio::test(start_paused = true)]
async fn healthy_target_passes_the_whole_suite() {
    let device = SimDevice::new(TARGET, SimConfig::default());
    let runner = ScenarioRunner::new(
        RunnerConfig::default(),
        Target {
            name: TARGET,
            transport: &device,
            snapshots: &device,
            mutator: &device,
        },
    );

    for scenario in subscribe_modes(&Deadlines::default()) {
        let report = runner.run(&scenario, Some(INTERFACE)).await;

        if KNOWN_BROKEN.contains(&scenario.name.as_str()) {
            assert!(report.skipped(), "{} is skipped", scenario.name);
            assert!(report.phases.is_empty(), "{} never ran", scenario.name);
        } else {
            assert!(report.passed(), "{} failed: {:?}", scenario.name, report.error());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn heartbeat_scenario_walks_three_phases_and_restores_the_leaf() {
    let device = SimDevice::new(TARGET, SimConfig::default());

    let report = run(&device, "subscribeOnChangeHeartbeatInterval").await;

    assert!(report.passed(), "passed: {:?}", report.error());
    assert_eq!(
        phases(&report),
        vec![Phase::Initial, Phase::Redelivery, Phase::MutationEcho],
        "initial, duplicate, change"
    );
    assert_eq!(report.phases[1].elapsed, Duration::from_secs(2), "one heartbeat period");
    assert_eq!(report.phases[1].termination, Termination::Covered, "covered by the duplicate");

    let mtu = assert_ok!(
        device
            .read_subtree("/interfaces/interface[name=Ethernet0]/state/mtu")
            .await
    );
    assert_eq!(mtu, json!(1500), "original MTU restored");
}

#[tokio::test(start_paused = true)]
async fn late_heartbeat_is_a_timing_violation() {
    let device = faulty(SimFaults {
        heartbeat_delay: Duration::from_secs(2),
        ..SimFaults::default()
    });

    let report = run(&device, "subscribeOnChangeHeartbeatInterval").await;

    let error = report.error().expect("failed");
    assert_matches!(error, ScenarioError::Timing { phase: Phase::Redelivery, violation }
        if violation.measured == Duration::from_secs(4) && violation.allowed == Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn missing_sync_exceeds_the_deadline() {
    let device = faulty(SimFaults {
        drop_sync: true,
        ..SimFaults::default()
    });

    let report = run(&device, "subscribeSampleNodeLevel").await;
    assert_matches!(
        report.error(),
        Some(ScenarioError::DeadlineExceeded { phase: Phase::Initial, observed }) if !observed.has_sync()
    );
    assert_eq!(report.phases[0].elapsed, Duration::from_secs(5), "short deadline spent");

    let report = run(&device, "subscribeOnceNodeLevel").await;
    assert_matches!(
        report.error(),
        Some(ScenarioError::StreamClosed { phase: Phase::Initial, .. })
    );
}

#[tokio::test(start_paused = true)]
async fn wrong_value_is_a_mismatch() {
    let device = faulty(SimFaults {
        corrupt_value: Some("/system/state/hostname".to_owned()),
        ..SimFaults::default()
    });

    let report = run(&device, "subscribeOnceSubtreeLevel").await;

    let Some(ScenarioError::Mismatch { phase, diff }) = report.error() else {
        panic!("expected a mismatch, got {:?}", report.error());
    };
    assert_eq!(*phase, Phase::Initial, "initial phase");
    assert!(diff.missing.is_empty() && diff.extra.is_empty(), "same keys");
    assert_eq!(diff.mismatched.len(), 1, "one corrupted leaf");
    assert_eq!(diff.mismatched[0].observed, "\"dut-corrupted\"", "observed value reported");
}

#[tokio::test(start_paused = true)]
async fn initial_data_under_updates_only_is_a_violation() {
    let device = faulty(SimFaults {
        leak_updates_only: true,
        ..SimFaults::default()
    });

    let report = run(&device, "subscribeOnceUpdatesOnly").await;

    let Some(ScenarioError::Mismatch { diff, .. }) = report.error() else {
        panic!("expected a mismatch, got {:?}", report.error());
    };
    assert!(!diff.extra.is_empty(), "leaked leaves are extra");
    assert!(diff.missing.is_empty(), "sync still seen");
}

#[tokio::test(start_paused = true)]
async fn error_status_on_a_valid_request_fails_the_scenario() {
    let device = faulty(SimFaults {
        reject_with: Some("rpc error: code = Unimplemented desc = not today".to_owned()),
        ..SimFaults::default()
    });

    assert_matches!(
        run(&device, "subscribeOnceNodeLevel").await.error(),
        Some(ScenarioError::Protocol { phase: Phase::Initial, description }) if description.contains("Unimplemented")
    );

    assert_matches!(
        run(&device, "subscribeSampleInvalidInterval").await.error(),
        Some(ScenarioError::UnexpectedErrorKind { .. })
    );
}

#[tokio::test(start_paused = true)]
async fn expected_rejection_that_never_comes() {
    let device = faulty(SimFaults {
        silent: true,
        ..SimFaults::default()
    });

    assert_matches!(
        run(&device, "subscribeSampleInvalidInterval").await.error(),
        Some(ScenarioError::MissingError { .. })
    );
}

#[tokio::test(start_paused = true)]
async fn delete_scenarios_pass_when_enabled() {
    let device = SimDevice::new(TARGET, SimConfig::default());

    for name in KNOWN_BROKEN {
        let report = run_with(&device, unskipped(), name).await;

        assert!(report.passed(), "{name} failed: {:?}", report.error());
        assert_eq!(phases(&report), vec![Phase::Initial, Phase::DeletionEcho], "{name} phases");
    }

    let hostname = assert_ok!(device.read_subtree("/system/config/hostname").await);
    assert_eq!(hostname, json!(TARGET), "deleted leaves restored");
}

#[tokio::test(start_paused = true)]
async fn collapsed_subtree_delete_is_expanded() {
    let device = faulty(SimFaults {
        collapse_subtree_deletes: true,
        ..SimFaults::default()
    });

    let report = run_with(&device, unskipped(), "subscribeDeleteSubtreeLevel").await;

    assert!(report.passed(), "one root notice covers every leaf: {:?}", report.error());
}

#[tokio::test(start_paused = true)]
async fn quiet_window_tolerates_volatile_noise() {
    let device = SimDevice::new(TARGET, SimConfig::default());

    let report = run(&device, "subscribeSampleSuppressRedundant").await;

    assert!(report.passed(), "passed: {:?}", report.error());
    assert_eq!(phases(&report), vec![Phase::Initial, Phase::QuietWindow], "phases");
    assert_eq!(report.phases[1].termination, Termination::WindowElapsed, "window ran out");
    assert_eq!(report.phases[1].elapsed, Duration::from_secs(3), "1.5 x sample interval");
}

#[tokio::test(start_paused = true)]
async fn redundant_samples_break_the_quiet_window() {
    let device = faulty(SimFaults {
        ignore_suppress: true,
        ..SimFaults::default()
    });

    let report = run(&device, "subscribeSampleSuppressRedundant").await;

    let Some(ScenarioError::Mismatch { phase, diff }) = report.error() else {
        panic!("expected a mismatch, got {:?}", report.error());
    };
    assert_eq!(*phase, Phase::QuietWindow, "quiet window phase");
    assert!(
        diff.extra.contains(&OutcomeKey::Path("/system/state/hostname".to_owned())),
        "unchanged hostname resent: {diff}"
    );
    assert!(
        !diff.extra.iter().any(|key| matches!(key, OutcomeKey::Path(path) if path.ends_with("uptime"))),
        "volatile leaves never count"
    );
}

#[tokio::test(start_paused = true)]
async fn unpushed_mutation_exceeds_the_deadline() {
    let device = faulty(SimFaults {
        drop_on_change: true,
        ..SimFaults::default()
    });

    let report = run(&device, "subscribeOnChange").await;

    assert_matches!(
        report.error(),
        Some(ScenarioError::DeadlineExceeded { phase: Phase::MutationEcho, observed }) if observed.is_empty()
    );
    assert_eq!(phases(&report), vec![Phase::Initial, Phase::MutationEcho], "phases");
    assert_eq!(report.phases[1].elapsed, Duration::from_secs(5), "short deadline spent");

    let mtu = assert_ok!(
        device
            .read_subtree("/interfaces/interface[name=Ethernet0]/state/mtu")
            .await
    );
    assert_eq!(mtu, json!(1500), "restored after failure");
}

#[tokio::test(start_paused = true)]
async fn slow_sample_is_a_timing_violation() {
    let device = faulty(SimFaults {
        sample_delay: Duration::from_secs(2),
        ..SimFaults::default()
    });

    let report = run(&device, "subscribeSampleNodeLevel").await;

    let error = report.error().expect("failed");
    assert_matches!(error, ScenarioError::Timing { phase: Phase::Redelivery, violation }
        if violation.cadence == Cadence::Sample(Duration::from_secs(2))
            && violation.measured == Duration::from_secs(4)
            && violation.allowed == Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn interface_scenarios_need_an_interface() {
    let device = SimDevice::new(TARGET, SimConfig::default());
    let runner = ScenarioRunner::new(
        RunnerConfig::default(),
        Target {
            name: TARGET,
            transport: &device,
            snapshots: &device,
            mutator: &device,
        },
    );

    let report = runner.run(&scenario("subscribeOnChange"), None).await;
    assert_matches!(report.error(), Some(ScenarioError::InterfaceRequired { .. }));

    let report = runner
        .run(&scenario("subscribeOnChangeUnsupportedPath"), None)
        .await;
    assert!(report.passed(), "error scenarios run without one: {:?}", report.error());
}

#[tokio::test(start_paused = true)]
async fn unreachable_target_is_a_transport_failure() {
    let device = faulty(SimFaults {
        refuse_streams: true,
        ..SimFaults::default()
    });

    assert_matches!(
        run(&device, "subscribeOnceNodeLevel").await.error(),
        Some(ScenarioError::Transport(_))
    );
}
