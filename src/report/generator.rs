//! Markdown report generation.
//!
//! This module generates supervision reports in Markdown from a built
//! [`Dashboard`], and the JSON equivalent.

use super::{BandSection, Dashboard, DashboardMetadata, ReportRow};
use crate::models::short_id;
use crate::scoring::{progress_bar, CriterionStat, DashboardSummary, TeacherSummary};
use anyhow::Result;

/// Knobs for the Markdown layout.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    /// Maximum rows in the criteria table (0 = all).
    pub top_criteria: usize,
    /// Include the per-band report listing.
    pub include_reports: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            top_criteria: 10,
            include_reports: true,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(dashboard: &Dashboard, options: MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# Supervision Report\n\n");
    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(dashboard, options));
    output.push_str(&generate_summary_section(&dashboard.summary));
    output.push_str(&generate_teachers_section(&dashboard.teachers));
    output.push_str(&generate_criteria_section(&dashboard.criteria, options.top_criteria));

    if options.include_reports {
        output.push_str(&generate_bands_section(&dashboard.bands));
    }

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if !metadata.school.is_empty() {
        section.push_str(&format!("- **School:** {}\n", metadata.school));
    }
    if !metadata.supervisor.is_empty() {
        section.push_str(&format!("- **Supervisor:** {}\n", metadata.supervisor));
    }
    if !metadata.academic_year.is_empty() {
        section.push_str(&format!("- **Academic Year:** {}\n", metadata.academic_year));
    }
    section.push_str(&format!("- **Scope:** {}\n", metadata.scope));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(dashboard: &Dashboard, options: MarkdownOptions) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Teachers](#teachers)\n");
    toc.push_str("- [Criteria](#criteria)\n");

    if options.include_reports && !dashboard.bands.is_empty() {
        toc.push_str("- [Reports by Band](#reports-by-band)\n");
        for section in &dashboard.bands {
            toc.push_str(&format!(
                "  - [{}](#{})\n",
                section.label,
                section.band.key().replace('_', "-")
            ));
        }
    }

    toc.push('\n');

    toc
}

fn generate_summary_section(summary: &DashboardSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!("- **Reports:** {}\n", summary.total));
    section.push_str(&format!(
        "- **Average:** {}\n\n",
        progress_bar(summary.average, 20)
    ));

    section.push_str("### Performance Bands\n\n");
    section.push_str("| Band | Range | Reports |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for (band, count) in &summary.by_band {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            band.label(),
            band.range(),
            count
        ));
    }
    section.push('\n');

    if !summary.by_kind.is_empty() {
        section.push_str("### Reports by Type\n\n");
        section.push_str("| Type | Reports |\n");
        section.push_str("|:---|:---:|\n");
        for (kind, count) in &summary.by_kind {
            section.push_str(&format!("| {} | {} |\n", kind, count));
        }
        section.push('\n');
    }

    section
}

fn generate_teachers_section(teachers: &[TeacherSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Teachers\n\n");

    if teachers.is_empty() {
        section.push_str("No reports recorded yet.\n\n");
        return section;
    }

    section.push_str("| Teacher | Reports | Average | Best | Latest | Band |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---|\n");
    for t in teachers {
        section.push_str(&format!(
            "| {} | {} | {:.1}% | {:.1}% | {} | {} |\n",
            t.teacher_name,
            t.report_count,
            t.average,
            t.best,
            t.latest.map(|d| d.to_string()).unwrap_or_default(),
            t.band.label()
        ));
    }
    section.push('\n');

    section
}

fn generate_criteria_section(criteria: &[CriterionStat], limit: usize) -> String {
    let mut section = String::new();

    section.push_str("## Criteria\n\n");

    if criteria.is_empty() {
        section.push_str("No criteria scored yet.\n\n");
        return section;
    }

    let shown = if limit == 0 {
        criteria.len()
    } else {
        limit.min(criteria.len())
    };

    section.push_str("| Criterion | Scored | Average |\n");
    section.push_str("|:---|:---:|:---|\n");
    for stat in &criteria[..shown] {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            stat.label,
            stat.count,
            progress_bar(stat.average, 10)
        ));
    }

    if shown < criteria.len() {
        section.push_str(&format!(
            "\n*{} more criteria not shown.*\n",
            criteria.len() - shown
        ));
    }
    section.push('\n');

    section
}

fn generate_bands_section(bands: &[BandSection]) -> String {
    let mut section = String::new();

    section.push_str("## Reports by Band\n\n");

    if bands.is_empty() {
        section.push_str("No reports match this scope.\n\n");
        return section;
    }

    for band in bands {
        section.push_str(&format!(
            "### {} {{#{}}}\n\n",
            band.label,
            band.band.key().replace('_', "-")
        ));
        for row in &band.reports {
            section.push_str(&generate_report_line(row));
        }
        section.push('\n');
    }

    section
}

fn generate_report_line(row: &ReportRow) -> String {
    let mut line = format!(
        "- {} **{}** ({}) {} - {:.1}%",
        row.color.emoji(),
        row.teacher_name,
        row.date,
        row.kind,
        row.percentage
    );

    if !row.heading.is_empty() {
        line.push_str(&format!(" - {}", row.heading));
    }
    line.push_str(&format!(" `{}`", short_id(&row.id)));
    if !row.notes.is_empty() {
        line.push_str(&format!("\n  > {}", row.notes));
    }
    line.push('\n');

    line
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by evalboard*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}
