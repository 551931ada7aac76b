use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scenario storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Directory holding one JSON blob per scenario.
    #[serde(default = "d_scenario_dir")]
    pub dir: PathBuf,
    /// YAML document with the role profiles. `None` runs with the
    /// built-in default profile only.
    #[serde(default)]
    pub profiles_path: Option<PathBuf>,
    /// Synthesize a demo scenario when an unknown id is requested.
    #[serde(default = "d_true")]
    pub allow_fallback: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            dir: d_scenario_dir(),
            profiles_path: None,
            allow_fallback: true,
        }
    }
}

fn d_scenario_dir() -> PathBuf {
    PathBuf::from("./data/scenarios")
}
fn d_true() -> bool {
    true
}
