//! In-memory latency and turn metrics.
//!
//! Ring buffers behind one lightweight mutex: per-stage latency samples
//! and the append-only turn log. Percentiles and SLA compliance are
//! computed on demand by `/metrics/summary`.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde::Serialize;

use hf_domain::turn::TurnRecord;

/// Samples kept per stage and turns kept in the ring.
const RING_CAPACITY: usize = 4096;

/// Pipeline stages with recorded latencies.
pub const STAGE_BACKCHANNEL: &str = "backchannel";
pub const STAGE_RETRIEVAL: &str = "retrieval";
pub const STAGE_LLM: &str = "llm";
pub const STAGE_DM: &str = "dm";
pub const STAGE_TURN: &str = "turn";

#[derive(Debug, Clone, Copy)]
struct Sample {
    ms: u64,
    ok: bool,
}

#[derive(Default)]
struct Inner {
    stages: HashMap<String, VecDeque<Sample>>,
    turns: VecDeque<TurnRecord>,
    turns_total: u64,
}

/// SLA targets the summary checks compliance against.
#[derive(Debug, Clone, Copy)]
pub struct SlaTargets {
    pub backchannel_ms: u64,
    pub turn_ms: u64,
}

pub struct MetricsRecorder {
    inner: Mutex<Inner>,
    sla: SlaTargets,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub count: usize,
    pub ok_count: usize,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub turns_total: u64,
    pub stages: HashMap<String, StageSummary>,
    pub sla_compliance: SlaCompliance,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlaCompliance {
    /// Fraction of turns completing within the turn SLA.
    pub turn: f64,
    /// Fraction of emitted backchannels within the backchannel SLA.
    pub backchannel: f64,
}

impl MetricsRecorder {
    pub fn new(sla: SlaTargets) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            sla,
        }
    }

    /// Record one stage latency sample.
    pub fn record_latency(&self, stage: &str, ms: u64, ok: bool) {
        let mut inner = self.inner.lock();
        let ring = inner.stages.entry(stage.to_owned()).or_default();
        if ring.len() == RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(Sample { ms, ok });
    }

    /// Append a completed turn.
    pub fn record_turn(&self, record: TurnRecord) {
        let mut inner = self.inner.lock();
        inner.turns_total += 1;
        if inner.turns.len() == RING_CAPACITY {
            inner.turns.pop_front();
        }
        inner.turns.push_back(record);
    }

    /// Summarize the most recent `window` samples per stage (0 = all
    /// retained samples).
    pub fn summary(&self, window: usize) -> MetricsSummary {
        let inner = self.inner.lock();

        let mut stages = HashMap::new();
        for (stage, ring) in &inner.stages {
            let samples: Vec<Sample> = recent(ring, window).copied().collect();
            if samples.is_empty() {
                continue;
            }
            let mut sorted: Vec<u64> = samples.iter().map(|s| s.ms).collect();
            sorted.sort_unstable();
            stages.insert(
                stage.clone(),
                StageSummary {
                    count: samples.len(),
                    ok_count: samples.iter().filter(|s| s.ok).count(),
                    p50_ms: percentile(&sorted, 50),
                    p95_ms: percentile(&sorted, 95),
                    p99_ms: percentile(&sorted, 99),
                },
            );
        }

        let turns: Vec<&TurnRecord> = recent(&inner.turns, window).collect();
        let turn_compliance = ratio(
            turns
                .iter()
                .filter(|t| t.timings.total_ms <= self.sla.turn_ms)
                .count(),
            turns.len(),
        );

        let backchannel_samples: Vec<Sample> = inner
            .stages
            .get(STAGE_BACKCHANNEL)
            .map(|ring| recent(ring, window).copied().collect())
            .unwrap_or_default();
        let backchannel_compliance = ratio(
            backchannel_samples
                .iter()
                .filter(|s| s.ok && s.ms <= self.sla.backchannel_ms)
                .count(),
            backchannel_samples.len(),
        );

        MetricsSummary {
            turns_total: inner.turns_total,
            stages,
            sla_compliance: SlaCompliance {
                turn: turn_compliance,
                backchannel: backchannel_compliance,
            },
        }
    }
}

fn recent<T>(ring: &VecDeque<T>, window: usize) -> impl Iterator<Item = &T> {
    let skip = if window == 0 || window >= ring.len() {
        0
    } else {
        ring.len() - window
    };
    ring.iter().skip(skip)
}

/// Nearest-rank percentile over a sorted slice.
fn percentile(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank - 1]
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_domain::scoring::ScoringUpdate;
    use hf_domain::turn::{ReplySource, StageTimings};

    fn recorder() -> MetricsRecorder {
        MetricsRecorder::new(SlaTargets {
            backchannel_ms: 500,
            turn_ms: 5000,
        })
    }

    fn turn(total_ms: u64) -> TurnRecord {
        TurnRecord {
            turn_seq: 1,
            session_id: "s1".into(),
            node_id: "n1".into(),
            transcript: "t".into(),
            backchannel_text: None,
            reply_text: "r".into(),
            next_node_id: None,
            scoring_update: ScoringUpdate {
                block: "b".into(),
                delta: 0.0,
                score: 0.5,
            },
            red_flags: vec![],
            source: ReplySource::Heuristic,
            timings: StageTimings {
                total_ms,
                ..Default::default()
            },
            completed_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn percentiles_over_uniform_samples() {
        let r = recorder();
        for ms in 1..=100 {
            r.record_latency(STAGE_LLM, ms, true);
        }
        let summary = r.summary(0);
        let llm = &summary.stages[STAGE_LLM];
        assert_eq!(llm.count, 100);
        assert_eq!(llm.p50_ms, 50);
        assert_eq!(llm.p95_ms, 95);
        assert_eq!(llm.p99_ms, 99);
    }

    #[test]
    fn sla_compliance_counts_late_turns() {
        let r = recorder();
        r.record_turn(turn(1000));
        r.record_turn(turn(4999));
        r.record_turn(turn(7000));
        let summary = r.summary(0);
        assert_eq!(summary.turns_total, 3);
        assert!((summary.sla_compliance.turn - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn backchannel_compliance_requires_ok_and_fast() {
        let r = recorder();
        r.record_latency(STAGE_BACKCHANNEL, 100, true);
        r.record_latency(STAGE_BACKCHANNEL, 600, true);
        r.record_latency(STAGE_BACKCHANNEL, 100, false);
        let summary = r.summary(0);
        assert!((summary.sla_compliance.backchannel - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn window_limits_samples() {
        let r = recorder();
        for ms in [10, 20, 1000] {
            r.record_latency(STAGE_DM, ms, true);
        }
        let summary = r.summary(2);
        let dm = &summary.stages[STAGE_DM];
        assert_eq!(dm.count, 2);
        assert_eq!(dm.p50_ms, 20);
    }

    #[test]
    fn empty_recorder_summary() {
        let summary = recorder().summary(0);
        assert_eq!(summary.turns_total, 0);
        assert!(summary.stages.is_empty());
        assert_eq!(summary.sla_compliance.turn, 1.0);
    }

    #[test]
    fn ring_caps_retention() {
        let r = recorder();
        for i in 0..(RING_CAPACITY as u64 + 10) {
            r.record_latency(STAGE_TURN, i, true);
        }
        let summary = r.summary(0);
        assert_eq!(summary.stages[STAGE_TURN].count, RING_CAPACITY);
    }
}
