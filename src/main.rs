//! evalboard - classroom observation scoring for school supervisors
//!
//! A CLI tool that stores evaluation reports in a local JSON store, scores
//! them into percentages and performance bands, and exports dashboards.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, store, import, etc.)
//!   2 - A listed report scored below --fail-below

mod cli;
mod config;
mod import;
mod models;
mod report;
mod scoring;
mod store;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use cli::{Args, Command, ExportFormat, FilterArgs, StatsView, TeacherCommand};
use config::{Config, CONFIG_FILE};
use models::{teacher_name, Report, Teacher};
use report::{Dashboard, DashboardMetadata, MarkdownOptions};
use scoring::{
    criterion_stats, group_by_band, group_percentages, progress_bar, report_percentage,
    teacher_summaries, Band,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use store::Store;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    debug!("evalboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .evalboard.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the school name, data directory and export defaults.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Load configuration from an explicit path, the default location, or defaults.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        None => Ok((Config::default(), None)),
    }
}

/// Dispatch a command. Returns the exit code.
fn run(args: Args, config: Config) -> Result<i32> {
    let store = Store::open(&config.general.data_dir).with_context(|| {
        format!(
            "Failed to open data directory {}",
            config.general.data_dir.display()
        )
    })?;
    info!("Using store at {}", store.root().display());

    match args.command {
        Command::InitConfig => handle_init_config().map(|_| 0),
        Command::Teacher { action } => handle_teacher(&store, action),
        Command::Import { file } => handle_import(&store, &file),
        Command::Add {
            teacher,
            date,
            kind,
            heading,
            class_name,
            notes,
            rubric,
        } => {
            let text = read_rubric(&rubric)?;
            let groups = import::parse_rubric(&text);
            if groups.iter().all(|g| g.criteria.is_empty()) {
                warn!("No criteria found in rubric text; the report will score 0%");
            }

            let evaluation = import::build_evaluation(
                kind,
                heading.unwrap_or_default(),
                class_name.unwrap_or_default(),
                groups,
            );
            let mut report = Report::new(
                teacher,
                date.unwrap_or_else(|| Local::now().date_naive()),
                evaluation,
            );
            report.notes = notes.unwrap_or_default();

            let teachers = store.teachers()?;
            if !teachers.iter().any(|t| t.id == report.teacher_id) {
                warn!("Teacher '{}' is not on the roster", report.teacher_id);
            }

            let pct = report_percentage(&report);
            let id = report.id;
            store.upsert_reports(vec![report])?;

            println!("✅ Saved report {}", id);
            println!("   {} {}", progress_bar(pct, 20), Band::from_percentage(pct));
            Ok(0)
        }
        Command::List { filter, fail_below } => handle_list(&store, &filter, fail_below),
        Command::Show { id } => {
            let report = store.find_report(&id)?;
            let teachers = store.teachers()?;

            print!("{}", report::generate_report_card(&report, &teachers));
            println!();
            for (group, pct) in group_percentages(&report) {
                println!("{:<24} {}", group, progress_bar(pct, 20));
            }
            Ok(0)
        }
        Command::Delete { id } => {
            let removed = store.delete_report(&id)?;
            println!(
                "🗑️  Deleted report {} ({}, {})",
                removed.id, removed.teacher_id, removed.date
            );
            Ok(0)
        }
        Command::Stats { by, filter } => handle_stats(&store, by, &filter),
        Command::Export {
            format,
            out,
            filter,
        } => handle_export(&store, &config, format, out, &filter),
        Command::Share { id, phone } => {
            let report = store.find_report(&id)?;
            let teachers = store.teachers()?;
            let card = report::generate_report_card(&report, &teachers);

            let phone = phone.or_else(|| config.share.default_phone.clone());
            let link = report::whatsapp_link(&card, phone.as_deref())
                .context("Failed to build share link")?;

            println!("{}", link);
            Ok(0)
        }
    }
}

fn handle_teacher(store: &Store, action: TeacherCommand) -> Result<i32> {
    match action {
        TeacherCommand::Add { id, name, subject } => {
            let updated = store.upsert_teacher(Teacher {
                id: id.clone(),
                name,
                subject,
            })?;
            if updated {
                println!("✅ Updated teacher {}", id);
            } else {
                println!("✅ Added teacher {}", id);
            }
        }
        TeacherCommand::List => {
            let teachers = store.teachers()?;
            if teachers.is_empty() {
                println!("No teachers on the roster.");
            }
            for t in &teachers {
                println!(
                    "{:<12} {:<28} {}",
                    t.id,
                    t.name,
                    t.subject.as_deref().unwrap_or("-")
                );
            }
        }
        TeacherCommand::Remove { id } => {
            let removed = store.remove_teacher(&id)?;
            println!("🗑️  Removed teacher {} ({})", removed.id, removed.name);
        }
    }
    Ok(0)
}

fn handle_import(store: &Store, file: &Path) -> Result<i32> {
    println!("📥 Importing reports from {}", file.display());

    let reports = import::import_file(file)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if reports.is_empty() {
        println!("   No reports found.");
        return Ok(0);
    }

    let (inserted, replaced) = store.upsert_reports(reports)?;
    println!("✅ Imported {} new and {} updated reports.", inserted, replaced);
    Ok(0)
}

fn read_rubric(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read rubric from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rubric file {}", path.display()))
}

fn select<'a>(reports: &'a [Report], teachers: &[Teacher], filter: &FilterArgs) -> Vec<&'a Report> {
    let report_filter = filter.to_filter();
    if report_filter.is_empty() {
        return reports.iter().collect();
    }

    let selected = report_filter.apply(reports, teachers);
    debug!(
        "Selected {} of {} reports ({})",
        selected.len(),
        reports.len(),
        filter.describe()
    );
    selected
}

fn handle_list(store: &Store, filter: &FilterArgs, fail_below: Option<f64>) -> Result<i32> {
    let reports = store.reports()?;
    let teachers = store.teachers()?;
    let mut selected = select(&reports, &teachers, filter);
    selected.sort_by(|a, b| b.date.cmp(&a.date));

    if selected.is_empty() {
        println!("No reports match {}.", filter.describe());
        return Ok(0);
    }

    for report in &selected {
        let pct = report_percentage(report);
        println!(
            "{}  {}  {:<22} {:<14} {}  {}",
            report.short_id(),
            report.date,
            teacher_name(&teachers, &report.teacher_id),
            report.kind().to_string(),
            progress_bar(pct, 10),
            Band::from_percentage(pct).label()
        );
    }
    println!("\n{} reports", selected.len());

    if let Some(threshold) = fail_below {
        let below = selected
            .iter()
            .filter(|r| report_percentage(r) < threshold)
            .count();

        if below > 0 {
            eprintln!(
                "\n⛔ {} report(s) scored below {:.1}%. Failing (exit code 2).",
                below, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn handle_stats(store: &Store, by: StatsView, filter: &FilterArgs) -> Result<i32> {
    let reports = store.reports()?;
    let teachers = store.teachers()?;
    let selected = select(&reports, &teachers, filter);

    println!("📊 Statistics for {}\n", filter.describe());

    match by {
        StatsView::Criterion => {
            let stats = criterion_stats(&selected);
            if stats.is_empty() {
                println!("No criteria scored.");
            }
            for stat in &stats {
                println!(
                    "{:<32} {:>4}x  {}",
                    stat.label,
                    stat.count,
                    progress_bar(stat.average, 20)
                );
            }
        }
        StatsView::Status => {
            let groups = group_by_band(&selected);
            if groups.is_empty() {
                println!("No reports.");
            }
            for group in &groups {
                println!("{} [{}]: {}", group.band, group.band.key(), group.reports.len());
                for report in &group.reports {
                    println!(
                        "   {}  {}  {} ({:.1}%)",
                        report.short_id(),
                        report.date,
                        teacher_name(&teachers, &report.teacher_id),
                        report_percentage(report)
                    );
                }
            }
        }
        StatsView::Teacher => {
            let summaries = teacher_summaries(&selected, &teachers);
            if summaries.is_empty() {
                println!("No reports.");
            }
            for s in &summaries {
                println!(
                    "{:<28} {:>3} reports  {}  {}",
                    s.teacher_name,
                    s.report_count,
                    progress_bar(s.average, 20),
                    s.band.label()
                );
            }
        }
    }

    Ok(0)
}

fn handle_export(
    store: &Store,
    config: &Config,
    format: Option<ExportFormat>,
    out: Option<PathBuf>,
    filter: &FilterArgs,
) -> Result<i32> {
    let reports = store.reports()?;
    let teachers = store.teachers()?;
    let selected = select(&reports, &teachers, filter);

    let metadata = DashboardMetadata {
        school: config.school.name.clone(),
        supervisor: config.school.supervisor.clone(),
        academic_year: config.school.academic_year.clone(),
        generated_at: Utc::now(),
        scope: filter.describe(),
    };
    let dashboard = Dashboard::build(&selected, &teachers, metadata);

    let format = format.unwrap_or(config.report.format);
    let output = match format {
        ExportFormat::Markdown => report::generate_markdown_report(
            &dashboard,
            MarkdownOptions {
                top_criteria: config.report.top_criteria,
                include_reports: config.report.include_reports,
            },
        ),
        ExportFormat::Json => report::generate_json_report(&dashboard)?,
        ExportFormat::Csv => report::generate_csv_report(&dashboard)?,
        ExportFormat::Text => report::generate_text_report(&dashboard),
    };

    match out {
        Some(path) => {
            std::fs::write(&path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "✅ Exported {} reports ({:?}) to {}",
                dashboard.summary.total,
                format,
                path.display()
            );
        }
        None => print!("{}", output),
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::sample_reports;
    use tempfile::TempDir;

    fn seeded_store(dir: &TempDir) -> Store {
        let store = Store::open(dir.path()).unwrap();
        // 81.25% and 37.5%
        store.upsert_reports(sample_reports()).unwrap();
        store
    }

    #[test]
    fn test_list_fails_below_threshold() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let code = handle_list(&store, &FilterArgs::default(), Some(50.0)).unwrap();
        assert_eq!(code, 2);
    }

    #[test]
    fn test_list_threshold_is_strict() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        assert_eq!(handle_list(&store, &FilterArgs::default(), Some(37.5)).unwrap(), 0);
        assert_eq!(handle_list(&store, &FilterArgs::default(), None).unwrap(), 0);
    }

    #[test]
    fn test_list_threshold_applies_to_selection_only() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let only_t2 = FilterArgs {
            teacher: Some("t-2".to_string()),
            ..Default::default()
        };
        assert_eq!(handle_list(&store, &only_t2, Some(80.0)).unwrap(), 0);

        let nobody = FilterArgs {
            teacher: Some("t-9".to_string()),
            ..Default::default()
        };
        assert_eq!(handle_list(&store, &nobody, Some(100.0)).unwrap(), 0);
    }

    #[test]
    fn test_list_empty_store_passes() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        assert_eq!(handle_list(&store, &FilterArgs::default(), Some(100.0)).unwrap(), 0);
    }
}
