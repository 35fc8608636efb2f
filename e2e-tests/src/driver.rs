use core::fmt::Write;

use camino::Utf8PathBuf;
use eyre::{bail, OptionExt, Result as EyreResult, WrapErr};
use gnmi_conformance::catalog::{subscribe_modes, ON_CHANGE_PATH};
use gnmi_conformance::{Scenario, ScenarioReport, ScenarioRunner, Target, Verdict};
use gnmi_primitives::subscription::INTERFACE_PLACEHOLDER;
use gnmi_primitives::transport::SnapshotAccessor;
use gnmi_primitives::tree;
use gnmi_sim::SimDevice;
use rand::seq::IteratorRandom;
use serde_json::from_slice;
use tokio::fs::{read, write};
use tracing::info;

use crate::config::Config;
use crate::TestEnvironment;

#[derive(Debug)]
pub struct Driver {
    environment: TestEnvironment,
    config: Config,
}

impl Driver {
    pub const fn new(environment: TestEnvironment, config: Config) -> Self {
        Self {
            environment,
            config,
        }
    }

    pub async fn run(&self) -> EyreResult<()> {
        self.environment.init().await?;

        let output = self.environment.output_writer;

        output.write_header("Starting simulated target", 1);
        let device = SimDevice::new(&self.config.target, self.config.sim.clone());
        output.write_json("Simulator config", device.config())?;

        let interface = self.preflight(&device).await?;

        let scenarios = select(self.load_scenarios().await?, self.environment.filter.as_deref());
        if scenarios.is_empty() {
            bail!("No scenario matches the filter {:?}", self.environment.filter);
        }

        let runner = ScenarioRunner::new(
            self.config.runner_config(self.environment.include_skipped),
            Target {
                name: &self.config.target,
                transport: &device,
                snapshots: &device,
                mutator: &device,
            },
        );

        output.write_header(&format!("Running suite {}", runner.config().suite), 1);
        output.write_str(&format!("Scenarios: {}", scenarios.len()));

        let mut report = TestRunReport::new(
            runner.config().suite.clone(),
            self.config.target.clone(),
            interface.clone(),
        );

        for scenario in &scenarios {
            output.write_header(&format!("Scenario {}", scenario.name), 2);
            output.write_json("Subscription", &scenario.spec)?;

            let outcome = runner.run(scenario, Some(&interface)).await;
            output.write_outcome(&outcome);

            report.scenarios.push(outcome);
        }

        output.write_header("Finished suite", 1);

        if let Err(e) = report.result() {
            output.write_str("Error occurred during test run:");
            output.write_str(&e.to_string());
        }

        let report_file = report.store_to_file(&self.environment.output_dir).await?;

        output.write_str(&format!("Report file: {report_file}"));

        report.result()
    }

    /// Picks the interface the interface-scoped scenarios run against and
    /// checks the target answers a read on it.
    async fn preflight(&self, device: &SimDevice) -> EyreResult<String> {
        let output = self.environment.output_writer;
        output.write_header("Pre-flight", 2);

        let interface = pick_interface(device.interfaces()).ok_or_eyre("target reports no interfaces")?;
        let mtu_path = ON_CHANGE_PATH.replace(INTERFACE_PLACEHOLDER, &interface);

        let mtu = device
            .read_subtree(&mtu_path)
            .await
            .wrap_err_with(|| format!("target did not answer a read of {mtu_path}"))?;
        let mtu = tree::render_leaf(&mtu).ok_or_eyre("interface MTU is not a leaf")?;

        info!(%interface, %mtu, "pre-flight passed");
        output.write_str(&format!("Picked interface: {interface} (mtu {mtu})"));

        Ok(interface)
    }

    async fn load_scenarios(&self) -> EyreResult<Vec<Scenario>> {
        let Some(file_path) = &self.config.scenarios else {
            return Ok(subscribe_modes(&self.config.deadlines));
        };

        self.environment
            .output_writer
            .write_str(&format!("Scenario file: {file_path}"));

        let scenarios = from_slice(&read(file_path).await?)
            .wrap_err_with(|| format!("malformed scenario file {file_path}"))?;

        Ok(scenarios)
    }
}

fn pick_interface(interfaces: Vec<String>) -> Option<String> {
    let mut rng = rand::thread_rng();
    interfaces.into_iter().choose(&mut rng)
}

fn select(scenarios: Vec<Scenario>, filter: Option<&str>) -> Vec<Scenario> {
    let Some(filter) = filter else {
        return scenarios;
    };

    scenarios
        .into_iter()
        .filter(|scenario| scenario.name.contains(filter))
        .collect()
}

struct TestRunReport {
    suite: String,
    target: String,
    interface: String,
    scenarios: Vec<ScenarioReport>,
}

impl TestRunReport {
    const fn new(suite: String, target: String, interface: String) -> Self {
        Self {
            suite,
            target,
            interface,
            scenarios: Vec::new(),
        }
    }

    fn result(&self) -> EyreResult<()> {
        let errors: Vec<String> = self
            .scenarios
            .iter()
            .filter_map(|report| Some(format!("{}: {}", report.name, report.error()?)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("Errors occurred during test run: {:?}", errors)
        }
    }

    async fn store_to_file(&self, folder: &Utf8PathBuf) -> EyreResult<Utf8PathBuf> {
        let markdown = self.to_markdown()?;
        let report_file = folder.join("report.md");
        write(&report_file, markdown).await?;
        Ok(report_file)
    }

    fn to_markdown(&self) -> EyreResult<String> {
        let mut markdown = String::new();

        writeln!(&mut markdown, "## E2E tests report")?;
        writeln!(&mut markdown, "### Suite: {}", self.suite)?;
        writeln!(
            &mut markdown,
            "Target `{}`, interface `{}`",
            self.target, self.interface
        )?;
        writeln!(&mut markdown)?;

        writeln!(&mut markdown, "| Scenario | UUID | Result | Phases |")?;
        writeln!(&mut markdown, "| :--- | :--- | :---: | :--- |")?;

        for report in &self.scenarios {
            let result = match report.verdict {
                Verdict::Passed => ":white_check_mark:",
                Verdict::Skipped => ":fast_forward:",
                Verdict::Failed(_) => ":x:",
            };

            let phases = report
                .phases
                .iter()
                .map(|phase| format!("{} ({:?}, {})", phase.phase, phase.elapsed, phase.termination))
                .collect::<Vec<_>>()
                .join(", ");

            writeln!(
                &mut markdown,
                "| {} | {} | {result} | {phases} |",
                report.name, report.uuid
            )?;
        }

        let failures: Vec<_> = self
            .scenarios
            .iter()
            .filter_map(|report| Some((&report.name, report.error()?)))
            .collect();

        if !failures.is_empty() {
            writeln!(&mut markdown)?;
            writeln!(&mut markdown, "### Failures")?;
            for (name, error) in failures {
                writeln!(&mut markdown, "- **{name}**: {error}")?;
            }
        }

        Ok(markdown)
    }
}
