use camino::Utf8PathBuf;
use gnmi_conformance::catalog::default_skip_list;
use gnmi_conformance::exclusions::{SkipList, VolatileExclusionList};
use gnmi_conformance::{Deadlines, RunnerConfig};
use gnmi_sim::SimConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Target name sent with every subscribe request.
    pub target: String,
    pub deadlines: Deadlines,
    /// Extra `"<suite>/<scenario>"` entries on top of the built-in skip list.
    pub skip: Box<[String]>,
    pub exclusions: ExclusionConfig,
    pub sim: SimConfig,
    /// JSON file with a scenario list replacing the built-in catalog.
    pub scenarios: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: "dut".to_owned(),
            deadlines: Deadlines::default(),
            skip: Box::default(),
            exclusions: ExclusionConfig::default(),
            sim: SimConfig::default(),
            scenarios: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExclusionConfig {
    pub extra: Box<[String]>,
    /// Use only `extra`, dropping the built-in volatile paths.
    pub replace_defaults: bool,
}

impl Config {
    pub fn runner_config(&self, include_skipped: bool) -> RunnerConfig {
        let base = if self.exclusions.replace_defaults {
            VolatileExclusionList::empty()
        } else {
            VolatileExclusionList::default()
        };

        let skip_list = if include_skipped {
            SkipList::default()
        } else {
            default_skip_list().extended(self.skip.iter().cloned())
        };

        RunnerConfig {
            exclusions: base.extended(self.exclusions.extra.iter().cloned()),
            skip_list,
            ..RunnerConfig::default()
        }
    }
}
