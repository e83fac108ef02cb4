use super::{Guess, Guesser};
use decrypto_core::vocab::WordIndex;
use tracing::{Level, event};

/// Truthy values (`1`, `true`, `on`) add the top candidates to every guess event.
pub const GUESS_DETAILS_ENV: &str = "DECRYPTO_GUESS_DETAILS";

pub(super) fn log_guess_decision(guesser: &Guesser, clue: &[WordIndex], guess: &Guess, policy: &str) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let clue_words: Vec<&str> = clue
        .iter()
        .filter_map(|index| guesser.vocabulary.word_at(*index))
        .collect();
    let telemetry = guesser.telemetry.as_ref();
    let has_run_metadata = telemetry.is_some();
    let run_id = telemetry.map(|meta| meta.run_id.as_str()).unwrap_or("");
    let round = telemetry.map(|meta| meta.round as i64).unwrap_or(-1);

    let (top_codes, top_scores): (Vec<String>, Vec<f64>) = if details_enabled() {
        guess
            .top
            .iter()
            .map(|(code, score)| (code.to_string(), *score))
            .unzip()
    } else {
        (Vec::new(), Vec::new())
    };

    event!(
        target: "decrypto_bot::guess",
        Level::INFO,
        has_run_metadata,
        run_id = %run_id,
        round,
        guesser = %guesser.name,
        policy,
        clue = ?clue_words,
        code = %guess.code,
        best_code = %guess.best_code,
        best_score = guess.best_score,
        margin = guess.margin.unwrap_or(0.0),
        candidate_count = guess.scores.len(),
        certain_slots = guess.metrics.certain_slots,
        max_support = guess.metrics.max_support,
        mean_entropy = guess.metrics.mean_entropy,
        top_codes = ?top_codes,
        top_scores = ?top_scores,
    );
}

pub(super) fn log_contradiction(guesser: &Guesser, slot: usize, word: WordIndex) {
    tracing::warn!(
        target: "decrypto_bot::reveal",
        guesser = %guesser.name,
        slot,
        word = guesser.vocabulary.word_at(word).unwrap_or("?"),
        reason = "no_probability_mass",
        message = "revealed clue contradicts belief; keeping prior"
    );
}

fn details_enabled() -> bool {
    std::env::var(GUESS_DETAILS_ENV)
        .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}
