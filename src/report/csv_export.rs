//! Spreadsheet export.

use super::Dashboard;
use anyhow::{Context, Result};
use serde::Serialize;

const HEADER: [&str; 11] = [
    "id",
    "teacher_id",
    "teacher_name",
    "date",
    "type",
    "heading",
    "criteria",
    "percentage",
    "band",
    "band_label",
    "notes",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    id: String,
    teacher_id: &'a str,
    teacher_name: &'a str,
    date: String,
    #[serde(rename = "type")]
    kind: &'static str,
    heading: &'a str,
    criteria: usize,
    percentage: String,
    band: &'static str,
    band_label: &'static str,
    notes: &'a str,
}

/// One row per report, newest first, percentages to two decimals. The
/// header row is written even when there are no reports.
pub fn generate_csv_report(dashboard: &Dashboard) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .context("Failed to write CSV header")?;

    for row in &dashboard.reports {
        writer
            .serialize(CsvRow {
                id: row.id.to_string(),
                teacher_id: &row.teacher_id,
                teacher_name: &row.teacher_name,
                date: row.date.to_string(),
                kind: row.kind.key(),
                heading: &row.heading,
                criteria: row.criteria,
                percentage: format!("{:.2}", row.percentage),
                band: row.band.key(),
                band_label: row.band.label(),
                notes: &row.notes,
            })
            .context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;

    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::{dashboard, metadata, roster};
    use crate::report::Dashboard;

    #[test]
    fn test_generate_csv_report() {
        let csv = generate_csv_report(&dashboard()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "id,teacher_id,teacher_name,date,type,heading,criteria,percentage,band,band_label,notes"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",t-2,Omar Khalil,2026-02-05,general,,4,81.25,band_81_89,Excellent,Term review"));
        assert!(lines[2].contains(",class_session,Mathematics,4,37.50,band_31_40,Weak,"));
    }

    #[test]
    fn test_csv_reads_back() {
        let csv = generate_csv_report(&dashboard()).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][8], "band_81_89");
    }

    #[test]
    fn test_empty_export_keeps_header() {
        let empty = Dashboard::build(&[], &roster(), metadata());
        let csv = generate_csv_report(&empty).unwrap();

        assert_eq!(csv.lines().count(), 1);
        assert_eq!(csv.lines().next(), Some(HEADER.join(",").as_str()));
    }
}
