//! Score aggregation.
//!
//! Turns a report's rubric scores into a single 0-100 percentage.

use crate::models::{Evaluation, Report, MAX_SCORE};
use serde::Serialize;

/// Percentage of the maximum possible score. Zero scores yield `0.0`.
pub fn percentage_of(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    let sum: u64 = scores.iter().map(|&s| s as u64).sum();
    let max_possible = scores.len() as u64 * MAX_SCORE as u64;

    (sum as f64 / max_possible as f64) * 100.0
}

/// Percentage for a whole report.
pub fn report_percentage(report: &Report) -> f64 {
    percentage_of(&report.evaluation.scores())
}

/// Raw numbers behind a percentage, for exports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub count: usize,
    pub sum: u64,
    pub max_possible: u64,
    pub percentage: f64,
}

impl ScoreBreakdown {
    pub fn from_scores(scores: &[u8]) -> Self {
        Self {
            count: scores.len(),
            sum: scores.iter().map(|&s| s as u64).sum(),
            max_possible: scores.len() as u64 * MAX_SCORE as u64,
            percentage: percentage_of(scores),
        }
    }

    pub fn for_report(report: &Report) -> Self {
        Self::from_scores(&report.evaluation.scores())
    }
}

/// Percentage per rubric group.
///
/// Flat rubrics come back as a single group named after the evaluation kind.
pub fn group_percentages(report: &Report) -> Vec<(String, f64)> {
    match &report.evaluation {
        Evaluation::ClassSession { groups, .. } => groups
            .iter()
            .map(|g| {
                let scores: Vec<u8> = g.criteria.iter().map(|c| c.score).collect();
                (g.name.clone(), percentage_of(&scores))
            })
            .collect(),
        other => vec![(other.kind().to_string(), percentage_of(&other.scores()))],
    }
}
