use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator budgets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-turn latency budgets. The backchannel and the substantive reply
/// run on separate deadlines derived from these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard deadline for the backchannel fork, from turn start.
    #[serde(default = "d_backchannel_sla_ms")]
    pub backchannel_sla_ms: u64,
    /// Total turn budget.
    #[serde(default = "d_turn_sla_ms")]
    pub turn_sla_ms: u64,
    /// Margin reserved for commit + emit; the LLM deadline is
    /// `turn_sla_ms - safety_margin_ms`.
    #[serde(default = "d_safety_ms")]
    pub safety_margin_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            backchannel_sla_ms: d_backchannel_sla_ms(),
            turn_sla_ms: d_turn_sla_ms(),
            safety_margin_ms: d_safety_ms(),
        }
    }
}

impl OrchestratorConfig {
    /// The substantive-path budget in milliseconds.
    pub fn llm_budget_ms(&self) -> u64 {
        self.turn_sla_ms.saturating_sub(self.safety_margin_ms)
    }
}

fn d_backchannel_sla_ms() -> u64 {
    500
}
fn d_turn_sla_ms() -> u64 {
    5000
}
fn d_safety_ms() -> u64 {
    300
}
