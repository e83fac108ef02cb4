use std::collections::HashMap;
use std::fs;
use std::path::Path;

use decrypto_core::code::Code;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{BenchmarkConfig, GuesserEntry, GuesserKindConfig};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline guesser '{0}' not present in simulation results")]
    MissingBaseline(String),
    #[error("guesser '{0}' defined in results but missing from configuration")]
    UnknownGuesser(String),
    #[error("baseline '{0}' missing for round {1}")]
    MissingBaselineRound(String, usize),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// One guesser's result for one round.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub guesser: String,
    pub round: usize,
    pub code: Code,
    pub guessed: Code,
    pub correct: bool,
    /// Rank of the true code among all candidates (0 = top).
    pub rank: usize,
    pub candidates: usize,
    pub best_score: f64,
    pub margin: Option<f64>,
    pub certain_slots: usize,
    pub elapsed_ms: f64,
}

pub struct AnalyticsCollector {
    baseline: String,
    guessers: HashMap<String, GuesserAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    guesser_order: Vec<String>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut guessers = HashMap::new();
        let mut order = Vec::new();
        for entry in &config.guessers {
            guessers.insert(
                entry.name.clone(),
                GuesserAccumulator::new(entry.clone(), config.metrics.latency_budget_ms),
            );
            order.push(entry.name.clone());
        }

        if !guessers.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            guessers,
            comparisons: HashMap::new(),
            guesser_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
        })
    }

    pub fn record_round(
        &mut self,
        round: usize,
        outcomes: &[RoundOutcome],
    ) -> Result<(), AnalyticsError> {
        let baseline_rank = outcomes
            .iter()
            .find(|outcome| outcome.guesser == self.baseline)
            .map(|outcome| outcome.rank as f64)
            .ok_or_else(|| AnalyticsError::MissingBaselineRound(self.baseline.clone(), round))?;

        for outcome in outcomes {
            let acc = self
                .guessers
                .get_mut(&outcome.guesser)
                .ok_or_else(|| AnalyticsError::UnknownGuesser(outcome.guesser.clone()))?;
            acc.record(outcome);
        }

        for outcome in outcomes {
            if outcome.guesser == self.baseline {
                continue;
            }
            // Positive when the guesser ranked the true code higher than the baseline did.
            let diff = baseline_rank - outcome.rank as f64;
            self.comparisons
                .entry(outcome.guesser.clone())
                .or_default()
                .record(diff);
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.guesser_order {
            if let Some(acc) = self.guessers.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            if report.name == self.baseline {
                comparisons.push(ComparisonReport {
                    guesser: report.name.clone(),
                    p_value: 1.0,
                    sample_size: report.rounds,
                });
                continue;
            }
            let (p_value, sample_size) = self
                .comparisons
                .remove(&report.name)
                .map(ComparisonAccumulator::wilcoxon_signed_rank)
                .unwrap_or((1.0, 0));
            comparisons.push(ComparisonReport {
                guesser: report.name.clone(),
                p_value,
                sample_size,
            });
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            guessers: reports,
            comparisons,
            latency_budget_ms: self.latency_budget_ms,
        }
        .enrich())
    }
}

struct GuesserAccumulator {
    entry: GuesserEntry,
    per_round_correct: Vec<f64>,
    rank_total: f64,
    reciprocal_rank_total: f64,
    total_latency_ms: f64,
    latency_budget_ms: u64,
}

impl GuesserAccumulator {
    fn new(entry: GuesserEntry, latency_budget_ms: u64) -> Self {
        Self {
            entry,
            per_round_correct: Vec::new(),
            rank_total: 0.0,
            reciprocal_rank_total: 0.0,
            total_latency_ms: 0.0,
            latency_budget_ms,
        }
    }

    fn record(&mut self, outcome: &RoundOutcome) {
        self.per_round_correct
            .push(if outcome.correct { 1.0 } else { 0.0 });
        self.rank_total += outcome.rank as f64;
        self.reciprocal_rank_total += 1.0 / (outcome.rank as f64 + 1.0);
        self.total_latency_ms += outcome.elapsed_ms;
    }

    fn into_report(self) -> GuesserReport {
        let rounds = self.per_round_correct.len();
        let mean = |total: f64| {
            if rounds == 0 {
                0.0
            } else {
                total / rounds as f64
            }
        };
        let accuracy = mean(self.per_round_correct.iter().sum());
        let average_ms_per_decision = mean(self.total_latency_ms);

        GuesserReport {
            name: self.entry.name.clone(),
            kind: self.entry.kind,
            temperature: self.entry.temperature,
            compression_threshold: self.entry.compression_threshold,
            rounds,
            accuracy,
            ci95: confidence_interval(&self.per_round_correct),
            mean_rank: mean(self.rank_total),
            mean_reciprocal_rank: mean(self.reciprocal_rank_total),
            average_ms_per_decision,
            delta_vs_baseline: 0.0,
            over_budget: average_ms_per_decision > self.latency_budget_ms as f64,
        }
    }
}

#[derive(Clone, Default)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided Wilcoxon signed-rank test (normal approximation, tie-corrected).
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let mut paired: Vec<(f64, f64)> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .map(|d| (d.abs(), d.signum()))
            .collect();
        let n = paired.len();
        if n == 0 {
            return (1.0, 0);
        }
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut w_plus = 0.0;
        let mut w_minus = 0.0;
        let mut tie_adjustment = 0.0;
        let mut i = 0;
        while i < n {
            let mut j = i;
            while j + 1 < n && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for (_, sign) in &paired[i..=j] {
                if *sign > 0.0 {
                    w_plus += rank;
                } else {
                    w_minus += rank;
                }
            }
            let ties = (j - i + 1) as f64;
            tie_adjustment += (ties.powi(3) - ties) / 48.0;
            i = j + 1;
        }

        let w = f64::min(w_plus, w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let Ok(normal) = Normal::new(0.0, 1.0) else {
            return (1.0, n);
        };
        let z = (((w - mean_w).abs() - 0.5) / variance_w.sqrt()).max(0.0);
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub guessers: Vec<GuesserReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_accuracy = self
            .guessers
            .iter()
            .find(|guesser| guesser.name == self.baseline)
            .map(|guesser| guesser.accuracy)
            .unwrap_or(0.0);

        for guesser in &mut self.guessers {
            guesser.delta_vs_baseline = guesser.accuracy - baseline_accuracy;
        }

        self
    }

    pub fn report(&self, name: &str) -> Option<&GuesserReport> {
        self.guessers.iter().find(|guesser| guesser.name == name)
    }

    pub fn p_value(&self, name: &str) -> Option<f64> {
        self.comparisons
            .iter()
            .find(|c| c.guesser == name)
            .map(|c| c.p_value)
    }

    pub fn render_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str("# Decoding Summary\n\n");
        rows.push_str(&format!(
            "Baseline: `{}`. Latency budget: {} ms average per decision\n\n",
            self.baseline, self.latency_budget_ms
        ));
        rows.push_str("| Guesser | Kind | Rounds | Accuracy | Δ vs baseline | 95% CI | Mean rank | MRR | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|---------|------|--------|----------|----------------|--------|-----------|-----|------------------|-------------|---------|\n");

        for guesser in &self.guessers {
            let p_value = self.p_value(&guesser.name).unwrap_or(1.0);
            rows.push_str(&format!(
                "| {name} | {kind:?} | {rounds} | {acc:.1}% | {delta:+.1}% | [{ci_low:.3}, {ci_high:.3}] | {rank:.2} | {mrr:.3} | {latency:.3} | {over_budget} | {pval:.3} |\n",
                name = guesser.name,
                kind = guesser.kind,
                rounds = guesser.rounds,
                acc = guesser.accuracy * 100.0,
                delta = guesser.delta_vs_baseline * 100.0,
                ci_low = guesser.ci95.0,
                ci_high = guesser.ci95.1,
                rank = guesser.mean_rank,
                mrr = guesser.mean_reciprocal_rank,
                latency = guesser.average_ms_per_decision,
                over_budget = if guesser.over_budget { "Yes" } else { "No" },
                pval = p_value,
            ));
        }
        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GuesserReport {
    pub name: String,
    pub kind: GuesserKindConfig,
    pub temperature: f64,
    pub compression_threshold: f64,
    pub rounds: usize,
    pub accuracy: f64,
    pub ci95: (f64, f64),
    pub mean_rank: f64,
    pub mean_reciprocal_rank: f64,
    pub average_ms_per_decision: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub guesser: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BenchmarkConfig {
        let yaml = r#"
run_id: "analytics"
game:
  rounds: 4
  keywords: 4
  code_length: 3
  clue_style: "literal"
vocabulary:
  size: 8
guessers:
  - name: "base"
    kind: "exact_match"
  - name: "other"
    kind: "similarity"
outputs:
  jsonl: "rows.jsonl"
  summary_md: "summary.md"
metrics:
  baseline: "base"
"#;
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(yaml).expect("yaml");
        cfg.validate().expect("valid");
        cfg
    }

    fn outcome(guesser: &str, round: usize, rank: usize) -> RoundOutcome {
        RoundOutcome {
            guesser: guesser.to_string(),
            round,
            code: Code::new(vec![0, 1, 2]),
            guessed: Code::new(vec![0, 1, 2]),
            correct: rank == 0,
            rank,
            candidates: 24,
            best_score: 0.0,
            margin: None,
            certain_slots: 4,
            elapsed_ms: 0.5,
        }
    }

    #[test]
    fn accumulates_accuracy_and_rank() {
        let mut collector = AnalyticsCollector::new(&config()).expect("collector");
        for round in 0..4 {
            let other_rank = if round % 2 == 0 { 0 } else { 3 };
            collector
                .record_round(round, &[outcome("base", round, 0), outcome("other", round, other_rank)])
                .expect("record");
        }
        let summary = collector.finalize().expect("summary");

        let base = summary.report("base").expect("base report");
        assert_eq!(base.rounds, 4);
        assert_eq!(base.accuracy, 1.0);
        assert_eq!(base.ci95, (1.0, 1.0));
        assert_eq!(base.mean_rank, 0.0);

        let other = summary.report("other").expect("other report");
        assert_eq!(other.accuracy, 0.5);
        assert_eq!(other.mean_rank, 1.5);
        assert!((other.delta_vs_baseline + 0.5).abs() < 1e-12);
        assert!(other.ci95.0 < 0.5 && other.ci95.1 > 0.5);
        assert!(!other.over_budget);

        let markdown = summary.render_markdown();
        assert!(markdown.contains("| base | ExactMatch | 4 | 100.0% |"));
        assert!(markdown.contains("| other | Similarity | 4 | 50.0% |"));
    }

    #[test]
    fn missing_baseline_round_is_an_error() {
        let mut collector = AnalyticsCollector::new(&config()).expect("collector");
        let err = collector
            .record_round(0, &[outcome("other", 0, 0)])
            .expect_err("baseline absent");
        assert!(matches!(err, AnalyticsError::MissingBaselineRound(name, 0) if name == "base"));
    }

    #[test]
    fn wilcoxon_flags_consistent_improvement() {
        let mut comparison = ComparisonAccumulator::default();
        for diff in 1..=20 {
            comparison.record(diff as f64);
        }
        let (p, n) = comparison.wilcoxon_signed_rank();
        assert_eq!(n, 20);
        assert!(p < 0.01, "p = {p}");
    }

    #[test]
    fn wilcoxon_ignores_zero_differences() {
        let mut comparison = ComparisonAccumulator::default();
        for _ in 0..5 {
            comparison.record(0.0);
        }
        assert_eq!(comparison.wilcoxon_signed_rank(), (1.0, 0));
    }
}
