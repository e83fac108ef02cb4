use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub guess: GuessTelemetrySummary,
    pub reveal: RevealTelemetrySummary,
}

#[derive(Debug, Default, Serialize)]
pub struct GuessTelemetrySummary {
    pub count: usize,
    pub avg_candidates: Option<f64>,
    pub avg_margin: Option<f64>,
    pub avg_mean_entropy: Option<f64>,
    pub avg_top_gap: Option<f64>,
    pub per_guesser: BTreeMap<String, usize>,
    pub policy_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct RevealTelemetrySummary {
    pub contradictions: usize,
    pub per_guesser: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Aggregates guess and reveal events from a JSON telemetry log.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut guess = GuessTelemetrySummary::default();
    let mut reveal = RevealTelemetrySummary::default();
    let mut candidate_avg = Average::default();
    let mut margin_avg = Average::default();
    let mut entropy_avg = Average::default();
    let mut gap_avg = Average::default();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            "decrypto_bot::guess" => {
                guess.count += 1;

                if let Some(count) = fields
                    .get("candidate_count")
                    .and_then(Value::as_i64)
                    .filter(|v| *v >= 0)
                {
                    candidate_avg.add(count as f64);
                }
                if let Some(margin) = fields.get("margin").and_then(Value::as_f64) {
                    margin_avg.add(margin);
                }
                if let Some(entropy) = fields.get("mean_entropy").and_then(Value::as_f64) {
                    entropy_avg.add(entropy);
                }
                if let Some(gap) = fields.get("top_scores").and_then(top_gap) {
                    gap_avg.add(gap);
                }

                *guess
                    .per_guesser
                    .entry(label(&fields, "guesser"))
                    .or_insert(0) += 1;
                *guess
                    .policy_counts
                    .entry(label(&fields, "policy"))
                    .or_insert(0) += 1;
            }
            "decrypto_bot::reveal" => {
                reveal.contradictions += 1;
                *reveal
                    .per_guesser
                    .entry(label(&fields, "guesser"))
                    .or_insert(0) += 1;
            }
            _ => {}
        }
    }

    guess.avg_candidates = candidate_avg.mean();
    guess.avg_margin = margin_avg.mean();
    guess.avg_mean_entropy = entropy_avg.mean();
    guess.avg_top_gap = gap_avg.mean();

    Ok(TelemetrySummary { guess, reveal })
}

fn label(fields: &serde_json::Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
        .to_string()
}

/// Gap between the two best logged scores.
fn top_gap(raw_scores: &Value) -> Option<f64> {
    let mut scores = parse_score_list(raw_scores)?;
    if scores.len() < 2 {
        return None;
    }
    scores.sort_by(|a, b| b.total_cmp(a));
    Some(scores[0] - scores[1])
}

fn parse_score_list(raw: &Value) -> Option<Vec<f64>> {
    if let Some(array) = raw.as_array() {
        return Some(array.iter().filter_map(Value::as_f64).collect());
    }

    let text = raw.as_str()?;
    serde_json::from_str::<Vec<f64>>(text).ok()
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(&json_path, serde_json::to_vec_pretty(&summary)?).map_err(|source| {
        TelemetryError::Io {
            context: "writing telemetry summary json",
            source,
        }
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    let guess = &outputs.summary.guess;
    section.push_str(&format!("- Guess events captured: {}\n", guess.count));
    if let Some(value) = guess.avg_candidates {
        section.push_str(&format!("- Avg candidate codes: {:.1}\n", value));
    }
    if let Some(value) = guess.avg_margin {
        section.push_str(&format!("- Avg best vs runner-up margin: {:.3}\n", value));
    }
    if let Some(value) = guess.avg_mean_entropy {
        section.push_str(&format!("- Avg belief entropy: {:.3}\n", value));
    }
    section.push_str(&format!(
        "- Contradicted reveals: {}\n",
        outputs.summary.reveal.contradictions
    ));

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    output.push_str("## Guesses\n");
    output.push_str(&format!("- Events: {}\n", summary.guess.count));
    if let Some(value) = summary.guess.avg_candidates {
        output.push_str(&format!("- Avg candidates: {:.1}\n", value));
    }
    if let Some(value) = summary.guess.avg_margin {
        output.push_str(&format!("- Avg margin: {:.3}\n", value));
    }
    if let Some(value) = summary.guess.avg_mean_entropy {
        output.push_str(&format!("- Avg belief entropy: {:.3}\n", value));
    }
    if let Some(value) = summary.guess.avg_top_gap {
        output.push_str(&format!("- Avg top-2 gap (detail logs): {:.3}\n", value));
    }
    if !summary.guess.per_guesser.is_empty() {
        output.push_str("- Per guesser:\n");
        for (name, count) in &summary.guess.per_guesser {
            output.push_str(&format!("  - {}: {}\n", name, count));
        }
    }
    output.push('\n');

    output.push_str("## Contradicted Reveals\n");
    if summary.reveal.per_guesser.is_empty() {
        output.push_str("- <none>\n");
    } else {
        for (name, count) in &summary.reveal.per_guesser {
            output.push_str(&format!("- {}: {}\n", name, count));
        }
    }
    output
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
        file
    }

    #[test]
    fn summarises_guess_and_reveal_events() {
        let lines = [
            r#"{"target":"decrypto_bot::guess","fields":{"guesser":"exact","policy":"argmax","candidate_count":24,"margin":2.0,"mean_entropy":0.0,"top_scores":"[0.0, -1.5, -2.0]"}}"#,
            r#"{"target":"decrypto_bot::guess","fields":{"guesser":"similar","policy":"argmax","candidate_count":12,"margin":1.0,"mean_entropy":1.0,"top_scores":"[]"}}"#,
            r#"{"target":"decrypto_bot::reveal","fields":{"guesser":"exact","slot":1}}"#,
            r#"{"target":"decrypto_bench::round","fields":{"guesser":"exact"}}"#,
        ];
        let file = write_temp_file(&lines);
        let summary = summarise_telemetry(file.path()).expect("summarise");
        assert_eq!(summary.guess.count, 2);
        assert_eq!(summary.guess.avg_candidates, Some(18.0));
        assert_eq!(summary.guess.avg_margin, Some(1.5));
        assert_eq!(summary.guess.avg_mean_entropy, Some(0.5));
        assert_eq!(summary.guess.avg_top_gap, Some(1.5));
        assert_eq!(summary.guess.per_guesser.get("exact"), Some(&1));
        assert_eq!(summary.guess.policy_counts.get("argmax"), Some(&2));
        assert_eq!(summary.reveal.contradictions, 1);
        assert_eq!(summary.reveal.per_guesser.get("exact"), Some(&1));
    }

    #[test]
    fn handles_missing_file() {
        let path = Path::new("tests/does/not/exist.jsonl");
        let summary = summarise_telemetry(path).expect("summarise missing file");
        assert_eq!(summary.guess.count, 0);
        assert!(summary.guess.avg_margin.is_none());
        assert!(summary.reveal.per_guesser.is_empty());
    }

    #[test]
    fn appends_highlights_to_summary_markdown() {
        let mut summary_file = tempfile::NamedTempFile::new().expect("summary temp file");
        writeln!(summary_file, "# Decoding Summary").expect("seed summary content");

        let outputs = TelemetryOutputs {
            summary: TelemetrySummary {
                guess: GuessTelemetrySummary {
                    count: 16,
                    avg_candidates: Some(24.0),
                    avg_margin: Some(0.75),
                    ..GuessTelemetrySummary::default()
                },
                reveal: RevealTelemetrySummary {
                    contradictions: 3,
                    ..RevealTelemetrySummary::default()
                },
            },
            json_path: PathBuf::from("telemetry_summary.json"),
            markdown_path: PathBuf::from("telemetry_summary.md"),
        };

        append_highlights_to_markdown(summary_file.path(), &outputs).expect("append highlights");

        let contents = std::fs::read_to_string(summary_file.path()).expect("read summary file");
        assert!(contents.starts_with("# Decoding Summary"));
        assert!(contents.contains("## Telemetry Highlights"));
        assert!(contents.contains("Guess events captured: 16"));
        assert!(contents.contains("Avg best vs runner-up margin: 0.750"));
        assert!(contents.contains("Contradicted reveals: 3"));
    }
}
