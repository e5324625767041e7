//! Report generation modules.
//!
//! This module builds the dashboard view of a set of reports and renders it
//! as Markdown, JSON, CSV or plain text, plus a share link for one report.

pub mod csv_export;
pub mod generator;
pub mod share;
pub mod text;

pub use csv_export::generate_csv_report;
pub use generator::{generate_json_report, generate_markdown_report, MarkdownOptions};
pub use share::whatsapp_link;
pub use text::{generate_report_card, generate_text_report};

use crate::models::{teacher_name, EvaluationKind, Report, Teacher};
use crate::scoring::{
    criterion_stats, group_by_band, report_percentage, teacher_summaries, Band, CriterionStat,
    DashboardSummary, ProgressColor, TeacherSummary,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One report flattened for tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub id: Uuid,
    pub teacher_id: String,
    pub teacher_name: String,
    pub date: NaiveDate,
    pub kind: EvaluationKind,
    pub heading: String,
    pub criteria: usize,
    pub percentage: f64,
    pub band: Band,
    pub color: ProgressColor,
    pub notes: String,
}

impl ReportRow {
    pub fn from_report(report: &Report, teachers: &[Teacher]) -> Self {
        let percentage = report_percentage(report);
        Self {
            id: report.id,
            teacher_id: report.teacher_id.clone(),
            teacher_name: teacher_name(teachers, &report.teacher_id).to_string(),
            date: report.date,
            kind: report.kind(),
            heading: report.evaluation.heading().unwrap_or_default().to_string(),
            criteria: report.evaluation.criteria().len(),
            percentage,
            band: Band::from_percentage(percentage),
            color: ProgressColor::from_percentage(percentage),
            notes: report.notes.clone(),
        }
    }
}

/// Reports in one band.
#[derive(Debug, Clone, Serialize)]
pub struct BandSection {
    pub band: Band,
    pub label: String,
    pub reports: Vec<ReportRow>,
}

/// Who the dashboard is for and what it covers.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    pub school: String,
    pub supervisor: String,
    pub academic_year: String,
    pub generated_at: DateTime<Utc>,
    /// Human description of the filter applied, or "all reports".
    pub scope: String,
}

/// Everything an export renders.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub summary: DashboardSummary,
    pub teachers: Vec<TeacherSummary>,
    pub criteria: Vec<CriterionStat>,
    pub bands: Vec<BandSection>,
    pub reports: Vec<ReportRow>,
}

impl Dashboard {
    pub fn build(reports: &[&Report], teachers: &[Teacher], metadata: DashboardMetadata) -> Self {
        let bands = group_by_band(reports)
            .into_iter()
            .map(|group| BandSection {
                band: group.band,
                label: group.band.to_string(),
                reports: group
                    .reports
                    .iter()
                    .map(|r| ReportRow::from_report(r, teachers))
                    .collect(),
            })
            .collect();

        let mut rows: Vec<ReportRow> = reports
            .iter()
            .map(|r| ReportRow::from_report(r, teachers))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));

        Self {
            metadata,
            summary: DashboardSummary::from_reports(reports),
            teachers: teacher_summaries(reports, teachers),
            criteria: criterion_stats(reports),
            bands,
            reports: rows,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{Criterion, CriterionGroup, Evaluation};

    pub fn roster() -> Vec<Teacher> {
        vec![
            Teacher {
                id: "t-1".to_string(),
                name: "Mona Saleh".to_string(),
                subject: Some("Mathematics".to_string()),
            },
            Teacher {
                id: "t-2".to_string(),
                name: "Omar Khalil".to_string(),
                subject: None,
            },
        ]
    }

    pub fn sample_reports() -> Vec<Report> {
        let date = |d| NaiveDate::from_ymd_opt(2026, 2, d).unwrap();

        let mut general = Report::new(
            "t-2",
            date(5),
            Evaluation::General {
                criteria: vec![
                    Criterion::new("Punctuality", 4),
                    Criterion::new("Record keeping", 4),
                    Criterion::new("Classroom management", 3),
                    Criterion::new("Professional development", 2),
                ],
            },
        );
        general.notes = "Term review".to_string();

        let session = Report::new(
            "t-1",
            date(3),
            Evaluation::ClassSession {
                subject: "Mathematics".to_string(),
                class_name: "7B".to_string(),
                groups: vec![
                    CriterionGroup {
                        name: "Planning".to_string(),
                        criteria: vec![Criterion::new("Lesson objectives", 4), Criterion::new("Timing", 1)],
                    },
                    CriterionGroup {
                        name: "Delivery".to_string(),
                        criteria: vec![Criterion::new("Questioning", 1), Criterion::new("Punctuality", 0)],
                    },
                ],
            },
        );

        vec![general, session]
    }

    pub fn metadata() -> DashboardMetadata {
        DashboardMetadata {
            school: "Al Noor School".to_string(),
            supervisor: "Huda Nasser".to_string(),
            academic_year: "2025/2026".to_string(),
            generated_at: Utc::now(),
            scope: "all reports".to_string(),
        }
    }

    pub fn dashboard() -> Dashboard {
        let reports = sample_reports();
        let refs: Vec<&Report> = reports.iter().collect();
        Dashboard::build(&refs, &roster(), metadata())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_dashboard_build() {
        let dashboard = dashboard();

        assert_eq!(dashboard.summary.total, 2);
        // newest first
        assert_eq!(dashboard.reports[0].teacher_name, "Omar Khalil");
        assert_eq!(dashboard.reports[0].band, Band::Band81To89);
        assert_eq!(dashboard.reports[1].heading, "Mathematics");
        assert_eq!(dashboard.reports[1].percentage, 37.5);

        assert_eq!(dashboard.bands.len(), 2);
        assert_eq!(dashboard.bands[0].band, Band::Band31To40);
        assert_eq!(dashboard.bands[1].band, Band::Band81To89);

        assert_eq!(dashboard.teachers[0].teacher_id, "t-2");
        let punctuality = dashboard
            .criteria
            .iter()
            .find(|c| c.label == "Punctuality")
            .unwrap();
        assert_eq!(punctuality.count, 2);
        assert_eq!(punctuality.average, 50.0);
    }
}
