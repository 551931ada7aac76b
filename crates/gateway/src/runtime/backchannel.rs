//! Backchannel selection.
//!
//! Picks a short filler utterance from the role's tone-partitioned
//! table. Selection is deterministic: round-robin on the session's
//! backchannel counter within the tone chosen by the available signal.
//! Rate limiting lives with the session cell — by the time `pick` runs,
//! the orchestrator has already cleared the interval gate.

use hf_domain::config::BackchannelTable;

/// The signal available when the backchannel fires.
#[derive(Debug, Clone, Copy)]
pub enum ToneSignal {
    /// Running score for the session so far.
    Score(f64),
    /// Only a partial transcript length is known.
    PartialLength(usize),
    /// Nothing yet (first turn).
    None,
}

/// Pick an utterance, or `None` when the chosen tone list is empty.
pub fn pick(table: &BackchannelTable, signal: ToneSignal, counter: u64) -> Option<&str> {
    let tone = match signal {
        ToneSignal::Score(s) if s >= table.positive_threshold => &table.generic_positive,
        ToneSignal::Score(s) if s < table.negative_threshold => &table.generic_negative,
        // A bare length signal carries no valence.
        ToneSignal::Score(_) | ToneSignal::PartialLength(_) | ToneSignal::None => {
            &table.generic_neutral
        }
    };

    if tone.is_empty() {
        return None;
    }
    Some(tone[(counter % tone.len() as u64) as usize].as_str())
}
