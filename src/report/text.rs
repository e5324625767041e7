//! Plain-text exports.
//!
//! A tab-delimited table of reports, and the report card used for terminal
//! output and share messages.

use super::Dashboard;
use crate::models::{teacher_name, Evaluation, Report, Teacher, MAX_SCORE};
use crate::scoring::{group_percentages, Band, ScoreBreakdown};
use std::fmt::Write;

/// Tab-delimited table of every report in the dashboard, newest first.
pub fn generate_text_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "id\tteacher\tdate\ttype\theading\tpercentage\tband"
    );
    for row in &dashboard.reports {
        let _ = writeln!(
            output,
            "{}\t{}\t{}\t{}\t{}\t{:.2}\t{}",
            row.id,
            row.teacher_name,
            row.date,
            row.kind.key(),
            row.heading,
            row.percentage,
            row.band.label()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Reports: {}\tAverage: {:.2}%",
        dashboard.summary.total, dashboard.summary.average
    );

    output
}

/// Human-readable card for a single report.
pub fn generate_report_card(report: &Report, teachers: &[Teacher]) -> String {
    let breakdown = ScoreBreakdown::for_report(report);
    let band = Band::from_percentage(breakdown.percentage);
    let mut output = String::new();

    let _ = writeln!(output, "Evaluation report");
    let _ = writeln!(
        output,
        "Teacher: {}",
        teacher_name(teachers, &report.teacher_id)
    );
    let _ = writeln!(output, "Date: {}", report.date);

    match &report.evaluation {
        Evaluation::General { .. } => {
            let _ = writeln!(output, "Type: {}", report.kind());
        }
        Evaluation::ClassSession {
            subject,
            class_name,
            ..
        } => {
            let _ = write!(output, "Type: {}", report.kind());
            if !subject.is_empty() {
                let _ = write!(output, " - {}", subject);
            }
            if !class_name.is_empty() {
                let _ = write!(output, " ({})", class_name);
            }
            let _ = writeln!(output);
        }
        Evaluation::Special { title, .. } => {
            let _ = writeln!(output, "Type: {} - {}", report.kind(), title);
        }
    }

    let _ = writeln!(
        output,
        "Score: {}/{} ({:.1}%) - {}",
        breakdown.sum, breakdown.max_possible, breakdown.percentage, band
    );

    match &report.evaluation {
        Evaluation::ClassSession { groups, .. } => {
            let percentages = group_percentages(report);
            for (group, (_, pct)) in groups.iter().zip(percentages) {
                let _ = writeln!(output);
                let _ = writeln!(output, "{} ({:.1}%)", group.name, pct);
                for c in &group.criteria {
                    let _ = writeln!(output, "- {}: {}/{}", c.label, c.score, MAX_SCORE);
                }
            }
        }
        other => {
            let _ = writeln!(output);
            for c in other.criteria() {
                let _ = writeln!(output, "- {}: {}/{}", c.label, c.score, MAX_SCORE);
            }
        }
    }

    if !report.notes.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Notes: {}", report.notes);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::{dashboard, roster, sample_reports};

    #[test]
    fn test_generate_text_report() {
        let text = generate_text_report(&dashboard());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "id\tteacher\tdate\ttype\theading\tpercentage\tband");
        assert!(lines[1].contains("\tOmar Khalil\t2026-02-05\tgeneral\t\t81.25\tExcellent"));
        assert!(lines[2].contains("\tclass_session\tMathematics\t37.50\tWeak"));
        assert!(text.contains("Reports: 2"));
    }

    #[test]
    fn test_report_card_general() {
        let reports = sample_reports();
        let card = generate_report_card(&reports[0], &roster());

        assert!(card.contains("Teacher: Omar Khalil"));
        assert!(card.contains("Score: 13/16 ("));
        assert!(card.contains("- Excellent (81-89%)"));
        assert!(card.contains("- Record keeping: 4/4"));
        assert!(card.contains("Notes: Term review"));
    }

    #[test]
    fn test_report_card_class_session_groups() {
        let reports = sample_reports();
        let card = generate_report_card(&reports[1], &roster());

        assert!(card.contains("Type: Class session - Mathematics (7B)"));
        assert!(card.contains("Planning (62.5%)"));
        assert!(card.contains("Delivery (12.5%)"));
        assert!(!card.contains("Notes:"));
    }
}
