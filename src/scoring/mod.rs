//! Scoring modules.
//!
//! Percentages, performance bands and grouped statistics over reports.

pub mod aggregator;
pub mod bands;
pub mod statistics;

pub use aggregator::{group_percentages, report_percentage, ScoreBreakdown};
pub use bands::{progress_bar, Band, ProgressColor};
pub use statistics::{
    criterion_stats, group_by_band, teacher_summaries, CriterionStat,
    DashboardSummary, ReportFilter, TeacherSummary,
};
