use clap::ValueEnum;
use eyre::Result as EyreResult;
use gnmi_conformance::{ScenarioReport, Verdict};
use serde::Serialize;

/// Progress output for whoever is watching the run.
#[derive(Clone, Copy, Debug)]
pub struct OutputWriter {
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    #[default]
    PlainText,
}

impl OutputWriter {
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn write_str(self, line: &str) {
        // Two trailing spaces force a markdown line break.
        match self.format {
            OutputFormat::Markdown => println!("{line}  "),
            OutputFormat::PlainText => println!("{line}"),
        }
    }

    /// `level` is the markdown heading depth; plain text pads with dashes instead.
    pub fn write_header(self, header: &str, level: usize) {
        match self.format {
            OutputFormat::Markdown => println!("{} {}  ", "#".repeat(level), header),
            OutputFormat::PlainText => {
                println!(
                    "{}{}{}",
                    "-".repeat(level * 5),
                    header,
                    "-".repeat(level * 5),
                );
            }
        }
    }

    /// Labelled JSON dump: a fenced block in markdown, one line otherwise.
    pub fn write_json<T>(self, label: &str, json: &T) -> EyreResult<()>
    where
        T: ?Sized + Serialize,
    {
        println!("{}", self.json_block(label, json)?);
        Ok(())
    }

    fn json_block<T>(self, label: &str, json: &T) -> EyreResult<String>
    where
        T: ?Sized + Serialize,
    {
        Ok(match self.format {
            OutputFormat::Markdown => {
                format!("{label}:  \n```json\n{}\n```", serde_json::to_string_pretty(json)?)
            }
            OutputFormat::PlainText => format!("{label}: {}", serde_json::to_string(json)?),
        })
    }

    /// Verdict line for one scenario followed by one line per phase.
    pub fn write_outcome(self, report: &ScenarioReport) {
        match &report.verdict {
            Verdict::Passed => self.write_str(&format!("{}: passed", report.name)),
            Verdict::Skipped => self.write_str(&format!("{}: skipped", report.name)),
            Verdict::Failed(error) => self.write_str(&format!("{}: FAILED ({error})", report.name)),
        }

        for phase in &report.phases {
            self.write_str(&format!(
                "  {} finished {} after {:?} with {} observed keys",
                phase.phase, phase.termination, phase.elapsed, phase.observed_keys
            ));
        }
    }
}
