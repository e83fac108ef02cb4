//! Log-domain arithmetic shared by beliefs, the expectation engine and the decoder.

/// Log-probability standing in for "impossible".
///
/// `exp(-1000.0)` is exactly `0.0` in IEEE double precision, while sums of a few
/// thousand sentinels stay far away from overflow. Terms at or below this value carry
/// no probability mass anywhere in the engine.
pub const LOG_ZERO: f64 = -1_000.0;

/// Whether `value` is indistinguishable from zero probability.
#[inline]
pub fn is_log_zero(value: f64) -> bool {
    !(value > LOG_ZERO)
}

/// Raises anything at or below the sentinel (including NaN) to exactly `LOG_ZERO`.
#[inline]
pub fn clamp_log(value: f64) -> f64 {
    if is_log_zero(value) { LOG_ZERO } else { value }
}

/// Stabilized `log(Σ exp(term))`.
///
/// Dead terms are skipped; when every term is dead the result is exactly `LOG_ZERO`.
pub fn log_sum_exp(terms: &[f64]) -> f64 {
    let max = terms
        .iter()
        .copied()
        .filter(|term| !is_log_zero(*term))
        .fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return LOG_ZERO;
    }

    let sum: f64 = terms
        .iter()
        .copied()
        .filter(|term| !is_log_zero(*term))
        .map(|term| (term - max).exp())
        .sum();
    max + sum.ln()
}

/// Whether a `belief + score` term can carry mass: both operands must be live.
///
/// A sentinel operand stays dead whatever the other operand adds to it.
#[inline]
pub fn is_live_term(log_p: f64, score: f64) -> bool {
    !is_log_zero(log_p) && !is_log_zero(score)
}

/// Stabilized `log(Σ exp(term))` over sums of live operands.
///
/// Nothing is filtered or clamped, so totals below the sentinel keep their order.
/// An empty slice means every term was dead and gives exactly `LOG_ZERO`.
pub fn log_sum_exp_live(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return if terms.is_empty() { LOG_ZERO } else { max };
    }
    let sum: f64 = terms.iter().map(|term| (term - max).exp()).sum();
    max + sum.ln()
}

/// Normalizes log-weights so their exponentials sum to one.
///
/// Returns `None` when no weight carries mass.
pub fn log_normalize(weights: &[f64]) -> Option<Vec<f64>> {
    let total = log_sum_exp(weights);
    if is_log_zero(total) {
        return None;
    }
    Some(
        weights
            .iter()
            .map(|weight| {
                if is_log_zero(*weight) {
                    LOG_ZERO
                } else {
                    clamp_log(weight - total)
                }
            })
            .collect(),
    )
}
