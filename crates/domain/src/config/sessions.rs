use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Seconds since the last turn after which an idle session is evicted
    /// and closed.
    #[serde(default = "d_idle_timeout_s")]
    pub idle_timeout_s: u64,
    /// How often the idle sweeper runs.
    #[serde(default = "d_sweep_interval_s")]
    pub sweep_interval_s: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_s: d_idle_timeout_s(),
            sweep_interval_s: d_sweep_interval_s(),
        }
    }
}

fn d_idle_timeout_s() -> u64 {
    1800
}
fn d_sweep_interval_s() -> u64 {
    30
}
