//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::EvaluationKind;
use crate::scoring::ReportFilter;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// evalboard - classroom observation scoring for school supervisors
///
/// Record evaluation reports, see how teachers and rubric criteria perform,
/// and export the results as Markdown, JSON, CSV, text or a WhatsApp link.
///
/// Examples:
///   evalboard teacher add --id t-1 --name "Mona Saleh" --subject Math
///   evalboard import visits.csv
///   evalboard list --teacher t-1 --fail-below 60
///   evalboard stats --by criterion --kind class-session
///   evalboard export --format markdown --out report.md
///   evalboard share 3f2a9c1d --phone 966501234567
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .evalboard.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the report store
    #[arg(long, global = true, value_name = "DIR", env = "EVALBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a default .evalboard.toml configuration file
    InitConfig,

    /// Manage the teacher roster
    Teacher {
        #[command(subcommand)]
        action: TeacherCommand,
    },

    /// Import reports from a .json or .csv file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Record a report from rubric text (`label: score` per line)
    Add {
        /// Teacher id
        #[arg(long)]
        teacher: String,

        /// Observation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Evaluation type
        #[arg(long, default_value = "general")]
        kind: EvaluationKind,

        /// Subject (class sessions) or title (special evaluations)
        #[arg(long)]
        heading: Option<String>,

        /// Class name for class sessions
        #[arg(long)]
        class_name: Option<String>,

        /// Supervisor notes
        #[arg(long)]
        notes: Option<String>,

        /// Rubric text file, or `-` for stdin
        #[arg(long, value_name = "FILE")]
        rubric: PathBuf,
    },

    /// List reports with their percentage and band
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Exit with code 2 if any listed report scores below this percentage
        #[arg(long, value_name = "PCT")]
        fail_below: Option<f64>,
    },

    /// Show one report in full
    Show {
        /// Report id or unique id prefix
        id: String,
    },

    /// Delete a report
    Delete {
        /// Report id or unique id prefix
        id: String,
    },

    /// Grouped statistics
    Stats {
        /// Grouping to compute
        #[arg(long, default_value = "criterion")]
        by: StatsView,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Export a dashboard of the selected reports
    Export {
        /// Output format (defaults to the config file setting)
        #[arg(long, value_name = "FORMAT")]
        format: Option<ExportFormat>,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print a WhatsApp link prefilled with a report card
    Share {
        /// Report id or unique id prefix
        id: String,

        /// Recipient phone number in international format
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TeacherCommand {
    /// Add or update a teacher
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        subject: Option<String>,
    },
    /// List the roster
    List,
    /// Remove a teacher (their reports are kept)
    Remove { id: String },
}

/// Report selection shared by list, stats and export.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only this evaluation type
    #[arg(long)]
    pub kind: Option<EvaluationKind>,

    /// Only this teacher id
    #[arg(long)]
    pub teacher: Option<String>,

    /// Case-insensitive text search
    #[arg(long)]
    pub search: Option<String>,

    /// Earliest date (inclusive)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest date (inclusive)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ReportFilter {
        ReportFilter {
            kind: self.kind,
            teacher_id: self.teacher.clone(),
            search: self.search.clone(),
            from: self.from,
            to: self.to,
        }
    }

    /// Human description for report headers.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        if let Some(kind) = self.kind {
            parts.push(format!("type {}", kind));
        }
        if let Some(ref teacher) = self.teacher {
            parts.push(format!("teacher {}", teacher));
        }
        if let Some(ref search) = self.search {
            parts.push(format!("matching \"{}\"", search));
        }
        match (self.from, self.to) {
            (Some(from), Some(to)) => parts.push(format!("{} to {}", from, to)),
            (Some(from), None) => parts.push(format!("since {}", from)),
            (None, Some(to)) => parts.push(format!("until {}", to)),
            (None, None) => {}
        }

        if parts.is_empty() {
            "all reports".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Output format for exports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// CSV, one row per report
    Csv,
    /// Tab-delimited text
    Text,
}

/// Grouping for the stats command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatsView {
    /// Average per rubric criterion
    Criterion,
    /// Reports per performance band
    Status,
    /// Average per teacher
    Teacher,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::List {
                filter, fail_below, ..
            } => {
                if let Some(threshold) = fail_below {
                    if !(0.0..=100.0).contains(threshold) {
                        return Err("--fail-below must be between 0 and 100".to_string());
                    }
                }
                validate_filter(filter)
            }
            Command::Stats { filter, .. } | Command::Export { filter, .. } => {
                validate_filter(filter)
            }
            Command::Teacher {
                action: TeacherCommand::Add { id, name, .. },
            } => {
                if id.trim().is_empty() || name.trim().is_empty() {
                    return Err("Teacher id and name must not be empty".to_string());
                }
                Ok(())
            }
            Command::Add { teacher, .. } if teacher.trim().is_empty() => {
                Err("--teacher must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn validate_filter(filter: &FilterArgs) -> Result<(), String> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(format!("--from {} is after --to {}", from, to));
        }
    }
    Ok(())
}
