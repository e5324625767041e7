//! Report filtering and grouped statistics.
//!
//! This module provides the criterion-level and status-level views used by
//! the dashboard and every export, plus per-teacher summaries.

use crate::models::{teacher_name, EvaluationKind, Report, Teacher, MAX_SCORE};
use crate::scoring::aggregator::report_percentage;
use crate::scoring::bands::Band;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Narrowing applied before statistics are computed.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub kind: Option<EvaluationKind>,
    pub teacher_id: Option<String>,
    /// Case-insensitive text matched against names, notes, headings and labels.
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.teacher_id.is_none()
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.from.is_none()
            && self.to.is_none()
    }

    pub fn matches(&self, report: &Report, teachers: &[Teacher]) -> bool {
        if let Some(kind) = self.kind {
            if report.kind() != kind {
                return false;
            }
        }

        if let Some(ref teacher_id) = self.teacher_id {
            if &report.teacher_id != teacher_id {
                return false;
            }
        }

        if let Some(from) = self.from {
            if report.date < from {
                return false;
            }
        }

        if let Some(to) = self.to {
            if report.date > to {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => search_matches(report, teachers, needle),
            _ => true,
        }
    }

    /// Apply the filter, keeping the original order.
    pub fn apply<'a>(&self, reports: &'a [Report], teachers: &[Teacher]) -> Vec<&'a Report> {
        reports
            .iter()
            .filter(|r| self.matches(r, teachers))
            .collect()
    }
}

fn search_matches(report: &Report, teachers: &[Teacher], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

    contains(report.teacher_id.as_str())
        || contains(teacher_name(teachers, &report.teacher_id))
        || contains(report.notes.as_str())
        || report.evaluation.heading().is_some_and(contains)
        || report
            .evaluation
            .criteria()
            .iter()
            .any(|c| contains(c.label.as_str()))
}

/// Aggregate for one criterion label across reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionStat {
    pub label: String,
    pub count: usize,
    pub average: f64,
}

/// Flatten every report's criteria into `label -> scores` and average each
/// label. Sorted descending by average; ties keep first-encounter order.
pub fn criterion_stats(reports: &[&Report]) -> Vec<CriterionStat> {
    let mut order: Vec<(String, Vec<u8>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for report in reports {
        for criterion in report.evaluation.criteria() {
            let slot = *index.entry(criterion.label.clone()).or_insert_with(|| {
                order.push((criterion.label.clone(), Vec::new()));
                order.len() - 1
            });
            order[slot].1.push(criterion.score);
        }
    }

    let mut stats: Vec<CriterionStat> = order
        .into_iter()
        .map(|(label, scores)| {
            let count = scores.len();
            let sum: u64 = scores.iter().map(|&s| s as u64).sum();
            let average = if count == 0 {
                0.0
            } else {
                sum as f64 / (count as f64 * MAX_SCORE as f64) * 100.0
            };
            CriterionStat {
                label,
                count,
                average,
            }
        })
        .collect();

    // sort_by is stable
    stats.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    stats
}

/// Reports falling into one performance band.
#[derive(Debug, Clone)]
pub struct BandGroup<'a> {
    pub band: Band,
    pub reports: Vec<&'a Report>,
}

/// Group reports by performance band, ascending by band. Empty bands are
/// omitted; reports keep their input order inside a band.
pub fn group_by_band<'a>(reports: &[&'a Report]) -> Vec<BandGroup<'a>> {
    let mut grouped: BTreeMap<Band, Vec<&'a Report>> = BTreeMap::new();

    for report in reports {
        grouped
            .entry(Band::from_percentage(report_percentage(report)))
            .or_default()
            .push(*report);
    }

    grouped
        .into_iter()
        .map(|(band, reports)| BandGroup { band, reports })
        .collect()
}

/// Per-teacher aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherSummary {
    pub teacher_id: String,
    pub teacher_name: String,
    pub report_count: usize,
    pub average: f64,
    pub best: f64,
    pub latest: Option<NaiveDate>,
    pub band: Band,
}

/// Average percentage per teacher, highest first.
pub fn teacher_summaries(reports: &[&Report], teachers: &[Teacher]) -> Vec<TeacherSummary> {
    let mut grouped: BTreeMap<&str, Vec<&Report>> = BTreeMap::new();

    for report in reports {
        grouped
            .entry(report.teacher_id.as_str())
            .or_default()
            .push(*report);
    }

    let mut summaries: Vec<TeacherSummary> = grouped
        .into_iter()
        .map(|(teacher_id, own)| {
            let percentages: Vec<f64> = own.iter().map(|r| report_percentage(r)).collect();
            let average = percentages.iter().sum::<f64>() / percentages.len() as f64;
            let best = percentages.iter().cloned().fold(0.0, f64::max);

            TeacherSummary {
                teacher_id: teacher_id.to_string(),
                teacher_name: teacher_name(teachers, teacher_id).to_string(),
                report_count: own.len(),
                average,
                best,
                latest: own.iter().map(|r| r.date).max(),
                band: Band::from_percentage(average),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    summaries
}

/// Headline numbers for a set of reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub average: f64,
    /// Every band, zero-filled, ascending.
    pub by_band: Vec<(Band, usize)>,
    pub by_kind: BTreeMap<EvaluationKind, usize>,
}

impl DashboardSummary {
    pub fn from_reports(reports: &[&Report]) -> Self {
        let mut band_counts: BTreeMap<Band, usize> =
            Band::ALL.iter().map(|&band| (band, 0)).collect();
        let mut by_kind: BTreeMap<EvaluationKind, usize> = BTreeMap::new();
        let mut total_percentage = 0.0;

        for report in reports {
            let pct = report_percentage(report);
            total_percentage += pct;
            *band_counts.entry(Band::from_percentage(pct)).or_default() += 1;
            *by_kind.entry(report.kind()).or_default() += 1;
        }

        let average = if reports.is_empty() {
            0.0
        } else {
            total_percentage / reports.len() as f64
        };

        Self {
            total: reports.len(),
            average,
            by_band: band_counts.into_iter().collect(),
            by_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Criterion, CriterionGroup, Evaluation};
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn general(teacher: &str, day: u32, items: &[(&str, i64)]) -> Report {
        let criteria = items.iter().map(|(l, s)| Criterion::new(*l, *s)).collect();
        Report::new(teacher, date(day), Evaluation::General { criteria })
    }

    fn roster() -> Vec<Teacher> {
        vec![
            Teacher {
                id: "t-1".to_string(),
                name: "Mona Saleh".to_string(),
                subject: Some("Math".to_string()),
            },
            Teacher {
                id: "t-2".to_string(),
                name: "Omar Khalil".to_string(),
                subject: None,
            },
        ]
    }

    #[test]
    fn test_criterion_stats_sorted_descending() {
        let a = general("t-1", 1, &[("Planning", 2), ("Questioning", 4)]);
        let b = general("t-2", 2, &[("Planning", 4), ("Homework", 1)]);

        let stats = criterion_stats(&[&a, &b]);

        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].label, "Questioning");
        assert_eq!(stats[0].average, 100.0);
        assert_eq!(stats[1].label, "Planning");
        assert_eq!(stats[1].count, 2);
        assert_eq!(stats[1].average, 75.0);
        assert_eq!(stats[2].label, "Homework");
        assert_eq!(stats[2].average, 25.0);
    }

    #[test]
    fn test_criterion_stats_ties_keep_encounter_order() {
        let a = general("t-1", 1, &[("Zeta", 3), ("Alpha", 3), ("Mid", 3)]);
        let stats = criterion_stats(&[&a]);
        let labels: Vec<_> = stats.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_criterion_stats_merges_class_session_groups() {
        let session = Report::new(
            "t-1",
            date(4),
            Evaluation::ClassSession {
                subject: "Math".to_string(),
                class_name: "7B".to_string(),
                groups: vec![
                    CriterionGroup {
                        name: "Opening".to_string(),
                        criteria: vec![Criterion::new("Engagement", 2)],
                    },
                    CriterionGroup {
                        name: "Closing".to_string(),
                        criteria: vec![Criterion::new("Engagement", 4)],
                    },
                ],
            },
        );

        let stats = criterion_stats(&[&session]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].average, 75.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(criterion_stats(&[]).is_empty());
        assert!(group_by_band(&[]).is_empty());
        assert!(teacher_summaries(&[], &[]).is_empty());

        let summary = DashboardSummary::from_reports(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.by_band.len(), 7);
        assert!(summary.by_band.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_group_by_band_orders_ascending() {
        // 19/20 = 95% and 2/5 = 40%
        let high = general(
            "t-1",
            1,
            &[("A", 4), ("B", 4), ("C", 4), ("D", 4), ("E", 3)],
        );
        let low = general("t-2", 2, &[("A", 2), ("B", 2), ("C", 1), ("D", 1), ("E", 2)]);

        let groups = group_by_band(&[&high, &low]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].band, Band::Band31To40);
        assert_eq!(groups[0].reports.len(), 1);
        assert_eq!(groups[0].reports[0].teacher_id, "t-2");
        assert_eq!(groups[1].band, Band::Band90To100);
        assert_eq!(groups[1].reports[0].teacher_id, "t-1");
    }

    #[test]
    fn test_empty_report_lands_in_lowest_band() {
        let empty = general("t-1", 1, &[]);
        let groups = group_by_band(&[&empty]);
        assert_eq!(groups[0].band, Band::Band0To30);
    }

    #[test]
    fn test_filter_by_kind_teacher_and_dates() {
        let teachers = roster();
        let reports = vec![
            general("t-1", 1, &[("Planning", 3)]),
            general("t-2", 5, &[("Planning", 3)]),
            Report::new(
                "t-1",
                date(9),
                Evaluation::Special {
                    title: "Lab safety".to_string(),
                    criteria: vec![],
                },
            ),
        ];

        let filter = ReportFilter {
            teacher_id: Some("t-1".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&reports, &teachers).len(), 2);

        let filter = ReportFilter {
            kind: Some(EvaluationKind::Special),
            ..Default::default()
        };
        assert_eq!(filter.apply(&reports, &teachers).len(), 1);

        let filter = ReportFilter {
            from: Some(date(2)),
            to: Some(date(8)),
            ..Default::default()
        };
        let matched = filter.apply(&reports, &teachers);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].teacher_id, "t-2");

        assert!(ReportFilter::default().is_empty());
        assert_eq!(ReportFilter::default().apply(&reports, &teachers).len(), 3);
    }

    #[test]
    fn test_search_matches_names_labels_and_headings() {
        let teachers = roster();
        let mut with_notes = general("t-2", 1, &[("Homework review", 2)]);
        with_notes.notes = "Strong rapport with students".to_string();
        let special = Report::new(
            "t-1",
            date(2),
            Evaluation::Special {
                title: "Lab Safety".to_string(),
                criteria: vec![],
            },
        );
        let reports = vec![with_notes, special];

        let search = |text: &str| ReportFilter {
            search: Some(text.to_string()),
            ..Default::default()
        };

        assert_eq!(search("mona").apply(&reports, &teachers).len(), 1);
        assert_eq!(search("HOMEWORK").apply(&reports, &teachers).len(), 1);
        assert_eq!(search("rapport").apply(&reports, &teachers).len(), 1);
        assert_eq!(search("lab safety").apply(&reports, &teachers).len(), 1);
        assert_eq!(search("nothing like this").apply(&reports, &teachers).len(), 0);
        assert_eq!(search("   ").apply(&reports, &teachers).len(), 2);
    }

    #[test]
    fn test_teacher_summaries() {
        let teachers = roster();
        let a = general("t-1", 1, &[("A", 4), ("B", 4)]);
        let b = general("t-1", 7, &[("A", 2), ("B", 2)]);
        let c = general("t-2", 3, &[("A", 1), ("B", 1)]);

        let summaries = teacher_summaries(&[&a, &b, &c], &teachers);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].teacher_name, "Mona Saleh");
        assert_eq!(summaries[0].report_count, 2);
        assert_eq!(summaries[0].average, 75.0);
        assert_eq!(summaries[0].best, 100.0);
        assert_eq!(summaries[0].latest, Some(date(7)));
        assert_eq!(summaries[0].band, Band::Band75To80);
        assert_eq!(summaries[1].teacher_id, "t-2");
        assert_eq!(summaries[1].band, Band::Band0To30);
    }

    #[test]
    fn test_dashboard_summary() {
        let a = general("t-1", 1, &[("A", 4), ("B", 4), ("C", 3), ("D", 2)]);
        let b = Report::new(
            "t-2",
            date(2),
            Evaluation::Special {
                title: String::new(),
                criteria: vec![],
            },
        );

        let summary = DashboardSummary::from_reports(&[&a, &b]);

        assert_eq!(summary.total, 2);
        assert!((summary.average - 40.625).abs() < 1e-9);
        assert_eq!(summary.by_kind.get(&EvaluationKind::General), Some(&1));
        assert_eq!(summary.by_kind.get(&EvaluationKind::Special), Some(&1));

        let count = |band: Band| {
            summary
                .by_band
                .iter()
                .find(|(b, _)| *b == band)
                .map(|(_, n)| *n)
        };
        assert_eq!(count(Band::Band81To89), Some(1));
        assert_eq!(count(Band::Band0To30), Some(1));
        assert_eq!(count(Band::Band41To60), Some(0));
    }

    proptest! {
        #[test]
        fn criterion_stats_never_increase(
            rows in proptest::collection::vec((0usize..6, 0i64..=4), 0..60)
        ) {
            let items: Vec<(String, i64)> = rows
                .iter()
                .map(|(label, score)| (format!("L{}", label), *score))
                .collect();
            let borrowed: Vec<(&str, i64)> =
                items.iter().map(|(l, s)| (l.as_str(), *s)).collect();
            let report = general("t-1", 1, &borrowed);

            let stats = criterion_stats(&[&report]);
            for pair in stats.windows(2) {
                prop_assert!(pair[0].average >= pair[1].average);
            }
            let total: usize = stats.iter().map(|s| s.count).sum();
            prop_assert_eq!(total, rows.len());
        }
    }
}
