//! The per-turn pipeline — the core orchestrator.
//!
//! One finalized transcript in, two events out: an early backchannel
//! (best-effort, hard 500 ms budget) and the completed turn. The
//! substantive path races the LLM against its deadline with the
//! heuristic floor always computed alongside; whichever is usable at
//! resolution time is committed under the session lock.
//!
//! Entry point: [`run_turn`] spawns the async pipeline and returns a
//! channel of [`TurnEvent`]s for the submitting request to drain.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;

use hf_domain::error::{Error, Result};
use hf_domain::profile::RoleProfile;
use hf_domain::scenario::{Node, Scenario};
use hf_domain::turn::{ReplySource, SessionEvent, StageTimings, TurnCompleted, TurnRecord};
use hf_providers::{parse_reply, prompts, reply_schema, ChatOptions, LlmBackend};
use hf_scoring::{bars, selector};
use hf_sessions::{SessionCell, TurnCommit};

use crate::runtime::backchannel::{self, ToneSignal};
use crate::runtime::metrics;
use crate::state::AppState;

/// Minimum remaining budget for the single LLM retry.
const RETRY_MIN_BUDGET: Duration = Duration::from_secs(1);

/// Heuristic confidence below which a `low_confidence` red flag is set.
const LOW_CONFIDENCE: f64 = 0.3;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TurnEvent — the per-turn channel event type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Events delivered to the request that submitted the turn. The
/// session-wide bus receives the same backchannel / completion events as
/// [`SessionEvent`]s; `Cancelled` and `Error` stay on the private
/// channel (cancellation is silent on the bus by design).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TurnEvent {
    #[serde(rename = "backchannel")]
    Backchannel { turn_seq: u64, text: String },

    #[serde(rename = "turn_complete")]
    Completed(TurnCompleted),

    /// The turn was superseded by a newer submit.
    #[serde(rename = "cancelled")]
    Cancelled,

    #[serde(rename = "error")]
    Error { message: String },
}

/// Input to a single turn.
pub struct TurnInput {
    pub session_id: String,
    /// The finalized transcript. Partial transcripts never reach the
    /// orchestrator; the ASR side only forwards `final` messages.
    pub transcript: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// run_turn — the core orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run one interview turn.
///
/// Returns a channel receiver of [`TurnEvent`]s. Fails fast with
/// `NotFound` when the session does not exist — no state is fabricated.
pub fn run_turn(state: AppState, input: TurnInput) -> Result<mpsc::Receiver<TurnEvent>> {
    let cell = state
        .sessions
        .get(&input.session_id)
        .ok_or_else(|| Error::NotFound(format!("session \"{}\"", input.session_id)))?;

    let (tx, rx) = mpsc::channel::<TurnEvent>(8);

    let turn_span = tracing::info_span!(
        "turn",
        session_id = %input.session_id,
    );
    tokio::spawn(
        async move {
            if let Err(e) = run_turn_inner(&state, &cell, &input.transcript, &tx).await {
                match e {
                    Error::Cancelled => {
                        let _ = tx.send(TurnEvent::Cancelled).await;
                    }
                    other => {
                        tracing::warn!(error = %other, "turn failed");
                        let _ = tx
                            .send(TurnEvent::Error {
                                message: other.to_string(),
                            })
                            .await;
                    }
                }
            }
        }
        .instrument(turn_span),
    );

    Ok(rx)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// The pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn run_turn_inner(
    state: &AppState,
    cell: &Arc<SessionCell>,
    transcript: &str,
    tx: &mpsc::Sender<TurnEvent>,
) -> Result<()> {
    // ── Step 1: acquire the turn slot ────────────────────────────────
    // begin_turn cancels any in-flight turn (newest-wins) and waits for
    // it to release the slot.
    let slot = cell.begin_turn().await;
    if slot.token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let t0 = Instant::now();
    let (turn_seq, node_id, overall_score, answered, critical_fail_recorded);
    {
        let mut s = cell.lock_state().await;
        let current = match &s.current_node_id {
            Some(id) if !s.critical_fail => id.clone(),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "session \"{}\": interview already ended",
                    cell.session_id
                )))
            }
        };
        s.turn_seq += 1;
        turn_seq = s.turn_seq;
        node_id = current;
        overall_score = s.overall_score;
        answered = !s.answers.is_empty();
        critical_fail_recorded = s.critical_fail_recorded;
    }

    // Resolve the read-mostly snapshots.
    let (scenario, profile) = resolve_snapshots(state, cell).await?;
    let Some(node) = scenario.node(&node_id).cloned() else {
        return Err(Error::NotFound(format!(
            "node \"{node_id}\" in scenario \"{}\"",
            scenario.id
        )));
    };

    // ── Step 2: backchannel fork ─────────────────────────────────────
    let backchannel_text = emit_backchannel(
        state,
        cell,
        turn_seq,
        if answered {
            ToneSignal::Score(overall_score)
        } else {
            ToneSignal::None
        },
        t0,
        tx,
    )
    .await;

    // ── Step 3: context fetch fork ───────────────────────────────────
    let cv_context = tokio::select! {
        biased;
        _ = slot.token.cancelled() => return Err(Error::Cancelled),
        chunks = fetch_cv_context(state, &node) => chunks,
    };

    // ── Steps 4+5: substantive fork with the heuristic floor ─────────
    let dm_start = Instant::now();
    let answer = bars::score_answer(transcript, &node.success_criteria);
    let mut dm_ms = dm_start.elapsed().as_millis() as u64;

    let current_scores = { cell.lock_state().await.block_scores.clone() };
    let llm_deadline = t0 + Duration::from_millis(state.config.orchestrator.llm_budget_ms());
    let llm_start = Instant::now();
    let llm_result = tokio::select! {
        biased;
        _ = slot.token.cancelled() => return Err(Error::Cancelled),
        result = call_llm(
            state,
            &node,
            transcript,
            &current_scores,
            &profile,
            &cv_context,
            llm_deadline,
        ) => result,
    };
    let llm_ms = llm_start.elapsed().as_millis() as u64;
    state
        .metrics
        .record_latency(metrics::STAGE_LLM, llm_ms, llm_result.is_some());

    // ── Step 6: resolution ───────────────────────────────────────────
    let resolve_start = Instant::now();
    let resolution = resolve(
        &scenario,
        &node,
        &profile,
        transcript,
        &answer,
        llm_result,
        critical_fail_recorded,
    );

    // ── Step 7: commit under the session lock ────────────────────────
    // Past this point the commit runs to completion; the cancellation
    // window closes here.
    if slot.token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let scoring_update;
    {
        let mut s = cell.lock_state().await;
        scoring_update = s.commit_turn(
            TurnCommit {
                node_id: node.id.clone(),
                block: node.category.clone(),
                transcript: transcript.to_owned(),
                score: resolution.score,
                weight: node.weight,
                next_node_id: resolution.next_node_id.clone(),
                red_flags: resolution.red_flags.clone(),
                critical_fail: resolution.critical_fail,
                critical_weakness: resolution.critical_weakness,
            },
            &profile.block_weights,
        );
    }
    dm_ms += resolve_start.elapsed().as_millis() as u64;
    state.metrics.record_latency(metrics::STAGE_DM, dm_ms, true);

    // ── Step 8: emit the completed turn ──────────────────────────────
    let total_ms = t0.elapsed().as_millis() as u64;
    let timings = StageTimings {
        asr_ms: 0,
        dm_ms,
        llm_ms,
        tts_ms: 0,
        total_ms,
    };
    let completed = TurnCompleted {
        turn_seq,
        reply: resolution.reply.clone(),
        next_node_id: resolution.next_node_id.clone(),
        scoring_update: scoring_update.clone(),
        red_flags: resolution.red_flags.clone(),
        source: resolution.source,
        timings,
    };

    state.metrics.record_turn(TurnRecord {
        turn_seq,
        session_id: cell.session_id.clone(),
        node_id: node.id.clone(),
        transcript: transcript.to_owned(),
        backchannel_text,
        reply_text: resolution.reply,
        next_node_id: resolution.next_node_id,
        scoring_update,
        red_flags: resolution.red_flags,
        source: resolution.source,
        timings,
        completed_at: chrono::Utc::now(),
    });
    state
        .metrics
        .record_latency(metrics::STAGE_TURN, total_ms, true);

    cell.publish(SessionEvent::TurnComplete(completed.clone()));
    let _ = tx.send(TurnEvent::Completed(completed)).await;

    tracing::debug!(
        turn_seq,
        total_ms,
        llm_ms,
        source = ?resolution.source,
        "turn complete"
    );
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Forks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Backchannel pick + emit. Failure is silent — a missed filler is
/// invisible to the candidate.
async fn emit_backchannel(
    state: &AppState,
    cell: &Arc<SessionCell>,
    turn_seq: u64,
    signal: ToneSignal,
    t0: Instant,
    tx: &mpsc::Sender<TurnEvent>,
) -> Option<String> {
    let cfg = &state.config.backchannel;
    if !cell.backchannel_allowed(Duration::from_millis(cfg.min_interval_ms)) {
        return None;
    }

    let role = {
        let s = cell.lock_state().await;
        s.role_profile_id.clone()
    };
    let table = cfg.table(&role);
    let text = backchannel::pick(table, signal, cell.backchannel_counter())?.to_owned();

    let elapsed = t0.elapsed().as_millis() as u64;
    let within_sla = elapsed <= state.config.orchestrator.backchannel_sla_ms;
    state
        .metrics
        .record_latency(metrics::STAGE_BACKCHANNEL, elapsed, within_sla);
    if !within_sla {
        // Too late to be useful as a filler; drop it rather than talking
        // over the substantive reply.
        return None;
    }

    cell.record_backchannel_emit();
    cell.publish(SessionEvent::Backchannel {
        turn_seq,
        text: text.clone(),
    });
    let _ = tx
        .send(TurnEvent::Backchannel {
            turn_seq,
            text: text.clone(),
        })
        .await;
    Some(text)
}

/// Resume context fetch. Errors and timeouts degrade to no context.
async fn fetch_cv_context(state: &AppState, node: &Node) -> Vec<String> {
    let cfg = &state.config.retrieval;
    let query = format!("{} {}", node.question, node.success_criteria.join(" "));

    let start = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_millis(cfg.timeout_ms),
        state.retrieval.search(&query, cfg.top_k, cfg.threshold),
    )
    .await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(chunks)) => {
            state
                .metrics
                .record_latency(metrics::STAGE_RETRIEVAL, elapsed, true);
            chunks.into_iter().map(|c| c.chunk_text).collect()
        }
        Ok(Err(e)) => {
            state
                .metrics
                .record_latency(metrics::STAGE_RETRIEVAL, elapsed, false);
            tracing::debug!(error = %e, "resume search failed, omitting cv_context");
            Vec::new()
        }
        Err(_) => {
            state
                .metrics
                .record_latency(metrics::STAGE_RETRIEVAL, elapsed, false);
            tracing::debug!("resume search timed out, omitting cv_context");
            Vec::new()
        }
    }
}

/// LLM call with prompt assembly and the single-retry policy. Returns
/// `None` on any failure — the caller falls back to the heuristic.
async fn call_llm(
    state: &AppState,
    node: &Node,
    transcript: &str,
    current_scores: &BTreeMap<String, f64>,
    profile: &RoleProfile,
    cv_context: &[String],
    deadline: Instant,
) -> Option<hf_providers::InterviewerReply> {
    let opts = ChatOptions {
        system: prompts::system_prompt(&profile.id),
        user: prompts::user_prompt(node, transcript, current_scores, profile, cv_context),
        schema: state
            .config
            .llm
            .json_schema_enforce
            .then(reply_schema),
        max_tokens: state.config.llm.max_tokens,
        temperature: state.config.llm.temperature,
        deadline,
    };

    let response = match complete_with_retry(state.llm.as_ref(), &opts).await {
        Ok(r) => r,
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, "LLM path failed, falling back to heuristic");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM path errored, falling back to heuristic");
            return None;
        }
    };

    let parsed = parse_reply(&response.content);
    if parsed.is_none() {
        tracing::warn!(
            model = %response.model,
            content_len = response.content.len(),
            "LLM response is not valid JSON, falling back to heuristic"
        );
    }
    parsed
}

/// One retry on upstream failure, only when at least a second of the
/// deadline remains.
async fn complete_with_retry(
    backend: &dyn LlmBackend,
    opts: &ChatOptions,
) -> hf_domain::error::Result<hf_providers::ChatResponse> {
    match backend.complete(opts).await {
        Err(e @ Error::UpstreamUnavailable(_))
            if opts.deadline.saturating_duration_since(Instant::now()) >= RETRY_MIN_BUDGET =>
        {
            tracing::warn!(error = %e, "LLM upstream error, retrying once");
            backend.complete(opts).await
        }
        other => other,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Resolution {
    score: f64,
    next_node_id: Option<String>,
    reply: String,
    red_flags: Vec<String>,
    source: ReplySource,
    critical_fail: bool,
    critical_weakness: bool,
}

/// Decide what to commit.
///
/// The LLM result is preferred when it is well-formed, scores the
/// current node's block, and proposes exactly the transition the
/// selector derives from its score — the selector is the only source of
/// transitions, so anything else falls back to the heuristic floor.
fn resolve(
    scenario: &Scenario,
    node: &Node,
    profile: &RoleProfile,
    transcript: &str,
    answer: &hf_domain::scoring::AnswerScore,
    llm: Option<hf_providers::InterviewerReply>,
    critical_fail_recorded: bool,
) -> Resolution {
    let accepted = llm.and_then(|reply| {
        if reply.scoring_update.block != node.category {
            tracing::debug!(
                got = %reply.scoring_update.block,
                expected = %node.category,
                "LLM scored the wrong block, falling back to heuristic"
            );
            return None;
        }
        let score = reply.scoring_update().score;
        let expected =
            selector::next_node(node, score, profile, &scenario.policy, critical_fail_recorded);
        if reply.next_node_id.as_deref() != expected {
            tracing::debug!(
                proposed = ?reply.next_node_id,
                expected = ?expected,
                "LLM proposed an off-policy transition, falling back to heuristic"
            );
            return None;
        }
        Some((score, reply))
    });

    let (score, next_node_id, reply_text, mut red_flags, source) = match accepted {
        Some((score, reply)) => (
            score,
            reply.next_node_id,
            reply.reply,
            reply.red_flags,
            ReplySource::Llm,
        ),
        None => {
            let score = answer.score;
            let next = selector::next_node(
                node,
                score,
                profile,
                &scenario.policy,
                critical_fail_recorded,
            )
            .map(ToOwned::to_owned);
            let reply = heuristic_reply(scenario, next.as_deref());
            let mut flags = Vec::new();
            if transcript.trim().is_empty() {
                flags.push("empty_answer".to_owned());
            }
            if answer.confidence < LOW_CONFIDENCE {
                flags.push("low_confidence".to_owned());
            }
            (score, next, reply, flags, ReplySource::Heuristic)
        }
    };

    let drill = profile
        .thresholds
        .drill
        .unwrap_or(scenario.policy.drill_threshold);
    let is_critical = profile.is_critical(&node.category);
    let critical_fail = is_critical && score < profile.thresholds.critical_fail;
    let critical_weakness = is_critical && score < drill;
    if critical_fail {
        red_flags.push(format!("critical_fail:{}", node.category));
    }

    Resolution {
        score,
        next_node_id,
        reply: reply_text,
        red_flags,
        source,
        critical_fail,
        critical_weakness,
    }
}

/// Reply used when the turn resolves heuristically: acknowledge and ask
/// the next question, or close the interview.
fn heuristic_reply(scenario: &Scenario, next_node_id: Option<&str>) -> String {
    match next_node_id.and_then(|id| scenario.node(id)) {
        Some(next) => format!("Got it. {}", next.question),
        None => "Thank you, that covers everything I wanted to ask. \
                 We will get back to you with the results."
            .to_owned(),
    }
}

/// Resolve the scenario and role-profile snapshots for a session.
async fn resolve_snapshots(
    state: &AppState,
    cell: &Arc<SessionCell>,
) -> Result<(Arc<Scenario>, Arc<RoleProfile>)> {
    let (scenario_id, role_id) = {
        let s = cell.lock_state().await;
        (s.scenario_id.clone(), s.role_profile_id.clone())
    };

    let scenario = if state.config.scenario.allow_fallback {
        state.scenarios.get_or_fallback(&scenario_id)
    } else {
        state
            .scenarios
            .get(&scenario_id)
            .ok_or_else(|| Error::NotFound(format!("scenario \"{scenario_id}\"")))?
    };

    Ok((scenario, state.profiles.get(&role_id)))
}
