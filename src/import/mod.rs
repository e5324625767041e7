//! Report import.
//!
//! Reports arrive as JSON exports, CSV sheets (one criterion per row) or
//! pasted rubric text. Every path clamps scores into `0..=4`.

use crate::models::{Criterion, CriterionGroup, Evaluation, EvaluationKind, Report};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Group name used when rubric text or CSV rows carry none.
pub const DEFAULT_GROUP: &str = "General";

/// Namespace for ids derived from import keys.
const IMPORT_NAMESPACE: Uuid = Uuid::from_u128(0x3b8f_2c61_9d4e_4a7b_b0c5_6e21_f4a9_d873);

/// Deterministic report id for imported records that carry no UUID, so the
/// same file imported twice updates instead of duplicating.
pub fn stable_report_id(parts: &[&str]) -> Uuid {
    Uuid::new_v5(&IMPORT_NAMESPACE, parts.join("\u{1f}").as_bytes())
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid report JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unknown evaluation type '{value}'")]
    UnknownKind { row: usize, value: String },

    #[error("row {row}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { row: usize, value: String },

    #[error("unsupported import format '{0}' (expected .json or .csv)")]
    UnsupportedFormat(String),
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Import a file, picking the parser from its extension.
pub fn import_file(path: &Path) -> ImportResult<Vec<Report>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let reports = match extension.as_str() {
        "json" => parse_json(&content)?,
        "csv" => parse_csv(&content)?,
        other => return Err(ImportError::UnsupportedFormat(other.to_string())),
    };

    debug!("Imported {} reports from {}", reports.len(), path.display());
    Ok(reports)
}

/// A report as it appears in a JSON export; the id is optional.
#[derive(Debug, Deserialize)]
struct ReportRecord {
    #[serde(default)]
    id: Option<Uuid>,
    teacher_id: String,
    date: NaiveDate,
    #[serde(default)]
    notes: String,
    #[serde(flatten)]
    evaluation: Evaluation,
}

impl ReportRecord {
    fn into_report(self) -> Report {
        let id = self.id.unwrap_or_else(|| {
            let date = self.date.to_string();
            stable_report_id(&[
                self.teacher_id.as_str(),
                date.as_str(),
                self.evaluation.kind().key(),
                self.evaluation.heading().unwrap_or_default(),
            ])
        });
        Report {
            id,
            teacher_id: self.teacher_id,
            date: self.date,
            notes: self.notes,
            evaluation: self.evaluation,
        }
    }
}

/// Parse a single report object or an array of reports.
///
/// Reports without an `id` get one derived from teacher, date, type and
/// heading.
pub fn parse_json(content: &str) -> ImportResult<Vec<Report>> {
    let records = if content.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<ReportRecord>>(content)?
    } else {
        vec![serde_json::from_str::<ReportRecord>(content)?]
    };

    Ok(records.into_iter().map(ReportRecord::into_report).collect())
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    report_key: String,
    teacher_id: String,
    date: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    class_name: Option<String>,
    #[serde(default)]
    group: Option<String>,
    label: String,
    score: i64,
    #[serde(default)]
    notes: Option<String>,
}

struct PendingReport {
    id: Uuid,
    teacher_id: String,
    date: NaiveDate,
    kind: EvaluationKind,
    heading: String,
    class_name: String,
    notes: String,
    groups: Vec<CriterionGroup>,
}

impl PendingReport {
    fn push(&mut self, group: &str, criterion: Criterion) {
        match self.groups.iter_mut().find(|g| g.name == group) {
            Some(existing) => existing.criteria.push(criterion),
            None => self.groups.push(CriterionGroup {
                name: group.to_string(),
                criteria: vec![criterion],
            }),
        }
    }

    /// Whether a later row repeats this report's header cells.
    fn matches_row(&self, row: &CsvRow) -> bool {
        self.teacher_id == row.teacher_id
            && EvaluationKind::from_key(&row.kind) == Some(self.kind)
            && NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").ok() == Some(self.date)
            && row.heading.as_deref().unwrap_or_default() == self.heading
    }

    fn finish(self) -> Report {
        let evaluation = build_evaluation(self.kind, self.heading, self.class_name, self.groups);
        Report {
            id: self.id,
            teacher_id: self.teacher_id,
            date: self.date,
            notes: self.notes,
            evaluation,
        }
    }
}

/// Parse CSV rows (`report_key,teacher_id,date,type,...,label,score`).
///
/// Rows sharing a `report_key` become one report, in encounter order. A key
/// that is itself a UUID becomes the report id; any other key is hashed into
/// one, so re-importing a sheet updates the same reports.
pub fn parse_csv(content: &str) -> ImportResult<Vec<Report>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut pending: Vec<PendingReport> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let row_number = i + 2;
        let row = result?;

        let slot = match index.get(&row.report_key) {
            Some(&slot) => {
                if !pending[slot].matches_row(&row) {
                    warn!(
                        "Row {}: report '{}' header differs from its first row, keeping the first",
                        row_number, row.report_key
                    );
                }
                slot
            }
            None => {
                let kind = EvaluationKind::from_key(&row.kind).ok_or_else(|| {
                    ImportError::UnknownKind {
                        row: row_number,
                        value: row.kind.clone(),
                    }
                })?;
                let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|_| {
                    ImportError::InvalidDate {
                        row: row_number,
                        value: row.date.clone(),
                    }
                })?;

                pending.push(PendingReport {
                    id: Uuid::parse_str(&row.report_key)
                        .unwrap_or_else(|_| stable_report_id(&[row.report_key.as_str()])),
                    teacher_id: row.teacher_id.clone(),
                    date,
                    kind,
                    heading: row.heading.clone().unwrap_or_default(),
                    class_name: row.class_name.clone().unwrap_or_default(),
                    notes: row.notes.clone().unwrap_or_default(),
                    groups: Vec::new(),
                });
                index.insert(row.report_key.clone(), pending.len() - 1);
                pending.len() - 1
            }
        };

        if !(0..=4).contains(&row.score) {
            warn!(
                "Row {}: score {} for '{}' clamped into 0-4",
                row_number, row.score, row.label
            );
        }

        let group = row.group.as_deref().unwrap_or(DEFAULT_GROUP);
        pending[slot].push(group, Criterion::new(row.label, row.score));
    }

    Ok(pending.into_iter().map(PendingReport::finish).collect())
}

/// Parse pasted rubric text into groups.
///
/// One criterion per line as `label: score` or `label - score`; a score may
/// be written `3/4`. A line `[Name]`, or a `## Name` line without a score,
/// starts a new group. Blank lines are ignored and malformed lines are
/// skipped with a warning.
pub fn parse_rubric(text: &str) -> Vec<CriterionGroup> {
    let mut groups: Vec<CriterionGroup> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = bracket_header(line) {
            groups.push(CriterionGroup {
                name: name.to_string(),
                criteria: Vec::new(),
            });
            continue;
        }

        match (parse_rubric_line(line), hash_header(line)) {
            (None, Some(name)) => groups.push(CriterionGroup {
                name: name.to_string(),
                criteria: Vec::new(),
            }),
            (Some(criterion), _) => {
                if groups.is_empty() {
                    groups.push(CriterionGroup {
                        name: DEFAULT_GROUP.to_string(),
                        criteria: Vec::new(),
                    });
                }
                if let Some(group) = groups.last_mut() {
                    group.criteria.push(criterion);
                }
            }
            (None, None) => warn!("Skipping rubric line {}: '{}'", i + 1, line),
        }
    }

    groups
}

fn bracket_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .map(str::trim)
        .filter(|n| !n.is_empty())
}

fn hash_header(line: &str) -> Option<&str> {
    line.strip_prefix('#')
        .map(|l| l.trim_start_matches('#').trim())
        .filter(|n| !n.is_empty())
}

fn parse_rubric_line(line: &str) -> Option<Criterion> {
    let split_colon = line.rsplit_once(':');
    let split_dash = line.rsplit_once(" - ");
    let split_tab = line.rsplit_once('\t');

    [split_colon, split_dash, split_tab]
        .into_iter()
        .flatten()
        .find_map(|(label, score)| {
            let label = label.trim();
            if label.is_empty() {
                return None;
            }
            let score = score.trim();
            let numerator = score.split_once('/').map_or(score, |(n, _)| n).trim();
            let value: i64 = numerator.parse().ok()?;
            Some(Criterion::new(label, value))
        })
}

/// Build an evaluation of `kind` from rubric groups.
///
/// Flat kinds drop the grouping and keep criteria in order.
pub fn build_evaluation(
    kind: EvaluationKind,
    heading: String,
    class_name: String,
    groups: Vec<CriterionGroup>,
) -> Evaluation {
    match kind {
        EvaluationKind::ClassSession => Evaluation::ClassSession {
            subject: heading,
            class_name,
            groups,
        },
        EvaluationKind::General => Evaluation::General {
            criteria: groups.into_iter().flat_map(|g| g.criteria).collect(),
        },
        EvaluationKind::Special => Evaluation::Special {
            title: heading,
            criteria: groups.into_iter().flat_map(|g| g.criteria).collect(),
        },
    }
}
