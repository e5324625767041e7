//! Local JSON key-value store.
//!
//! Each key is one JSON document inside the data directory. A missing
//! document reads as an empty collection, and every write replaces the
//! document atomically.

use crate::models::{Report, Teacher};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Key holding the teacher roster.
pub const TEACHERS_KEY: &str = "teachers";
/// Key holding all reports.
pub const REPORTS_KEY: &str = "reports";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no report matches id '{0}'")]
    UnknownReport(String),

    #[error("id prefix '{0}' matches more than one report")]
    AmbiguousReport(String),

    #[error("no teacher with id '{0}'")]
    UnknownTeacher(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle on a data directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        debug!("Store opened at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Read a document. Missing documents yield `T::default()`.
    pub fn load<T>(&self, key: &str) -> StoreResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.key_path(key);

        if !path.exists() {
            debug!("Key '{}' not present, using empty value", key);
            return Ok(T::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Parse { path, source })
    }

    /// Write a document atomically.
    pub fn save<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let path = self.key_path(key);
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!("Saved key '{}' ({} bytes)", key, json.len());
        Ok(())
    }

    pub fn reports(&self) -> StoreResult<Vec<Report>> {
        self.load(REPORTS_KEY)
    }

    pub fn save_reports(&self, reports: &[Report]) -> StoreResult<()> {
        self.save(REPORTS_KEY, reports)
    }

    pub fn teachers(&self) -> StoreResult<Vec<Teacher>> {
        self.load(TEACHERS_KEY)
    }

    pub fn save_teachers(&self, teachers: &[Teacher]) -> StoreResult<()> {
        self.save(TEACHERS_KEY, teachers)
    }

    /// Insert reports, replacing any with the same id in place.
    ///
    /// Returns `(inserted, replaced)`.
    pub fn upsert_reports(&self, incoming: Vec<Report>) -> StoreResult<(usize, usize)> {
        let mut reports = self.reports()?;
        let mut inserted = 0;
        let mut replaced = 0;

        for report in incoming {
            match reports.iter_mut().find(|r| r.id == report.id) {
                Some(existing) => {
                    *existing = report;
                    replaced += 1;
                }
                None => {
                    reports.push(report);
                    inserted += 1;
                }
            }
        }

        self.save_reports(&reports)?;
        info!("Stored reports: {} new, {} updated", inserted, replaced);
        Ok((inserted, replaced))
    }

    /// Find a report by full id or unique id prefix.
    pub fn find_report(&self, id: &str) -> StoreResult<Report> {
        let reports = self.reports()?;
        let index = resolve_report(&reports, id)?;
        Ok(reports[index].clone())
    }

    /// Delete a report by full id or unique id prefix.
    pub fn delete_report(&self, id: &str) -> StoreResult<Report> {
        let mut reports = self.reports()?;
        let index = resolve_report(&reports, id)?;
        let removed = reports.remove(index);
        self.save_reports(&reports)?;
        info!("Deleted report {}", removed.id);
        Ok(removed)
    }

    /// Insert or update a teacher by id. Returns `true` when updated.
    pub fn upsert_teacher(&self, teacher: Teacher) -> StoreResult<bool> {
        let mut teachers = self.teachers()?;
        let updated = match teachers.iter_mut().find(|t| t.id == teacher.id) {
            Some(existing) => {
                *existing = teacher;
                true
            }
            None => {
                teachers.push(teacher);
                false
            }
        };
        self.save_teachers(&teachers)?;
        Ok(updated)
    }

    /// Remove a teacher from the roster. Their reports are kept.
    pub fn remove_teacher(&self, id: &str) -> StoreResult<Teacher> {
        let mut teachers = self.teachers()?;
        let index = teachers
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::UnknownTeacher(id.to_string()))?;
        let removed = teachers.remove(index);
        self.save_teachers(&teachers)?;
        Ok(removed)
    }
}

fn resolve_report(reports: &[Report], id: &str) -> StoreResult<usize> {
    let needle = id.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(StoreError::UnknownReport(id.to_string()));
    }

    let mut matches = reports
        .iter()
        .enumerate()
        .filter(|(_, r)| r.id.simple().to_string().starts_with(&needle))
        .map(|(i, _)| i);

    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (Some(_), Some(_)) => Err(StoreError::AmbiguousReport(id.to_string())),
        (None, _) => Err(StoreError::UnknownReport(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Criterion, Evaluation};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_report(teacher: &str) -> Report {
        Report::new(
            teacher,
            NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            Evaluation::General {
                criteria: vec![Criterion::new("Planning", 3)],
            },
        )
    }

    #[test]
    fn test_missing_keys_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("data")).unwrap();

        assert!(store.reports().unwrap().is_empty());
        assert!(store.teachers().unwrap().is_empty());
    }

    #[test]
    fn test_upsert_replaces_same_id() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut report = sample_report("t-1");
        assert_eq!(store.upsert_reports(vec![report.clone()]).unwrap(), (1, 0));

        report.notes = "Follow-up visit".to_string();
        let other = sample_report("t-2");
        assert_eq!(
            store.upsert_reports(vec![report.clone(), other]).unwrap(),
            (1, 1)
        );

        let stored = store.reports().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, report.id);
        assert_eq!(stored[0].notes, "Follow-up visit");
    }

    #[test]
    fn test_find_and_delete_by_prefix() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let report = sample_report("t-1");
        store.upsert_reports(vec![report.clone()]).unwrap();

        let prefix = report.short_id();
        assert_eq!(store.find_report(&prefix).unwrap().id, report.id);
        assert_eq!(
            store.find_report(&report.id.to_string()).unwrap().id,
            report.id
        );

        let removed = store.delete_report(&prefix).unwrap();
        assert_eq!(removed.id, report.id);
        assert!(store.reports().unwrap().is_empty());

        assert!(matches!(
            store.delete_report(&prefix),
            Err(StoreError::UnknownReport(_))
        ));
    }

    #[test]
    fn test_ambiguous_prefix() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut first = sample_report("t-1");
        first.id = uuid::Uuid::from_u128(0xabc1_0000_0000_0000_0000_0000_0000_0001);
        let mut second = sample_report("t-2");
        second.id = uuid::Uuid::from_u128(0xabc2_0000_0000_0000_0000_0000_0000_0002);
        store.upsert_reports(vec![first, second.clone()]).unwrap();

        assert!(matches!(
            store.find_report("abc"),
            Err(StoreError::AmbiguousReport(_))
        ));
        assert!(matches!(
            store.find_report(""),
            Err(StoreError::UnknownReport(_))
        ));
        assert_eq!(store.find_report("ABC2").unwrap().id, second.id);
    }

    #[test]
    fn test_teacher_roster() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let teacher = Teacher {
            id: "t-1".to_string(),
            name: "Mona Saleh".to_string(),
            subject: None,
        };
        assert!(!store.upsert_teacher(teacher.clone()).unwrap());
        assert!(store
            .upsert_teacher(Teacher {
                subject: Some("Math".to_string()),
                ..teacher
            })
            .unwrap());

        let teachers = store.teachers().unwrap();
        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].subject.as_deref(), Some("Math"));

        store.remove_teacher("t-1").unwrap();
        assert!(matches!(
            store.remove_teacher("t-1"),
            Err(StoreError::UnknownTeacher(_))
        ));
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        fs::write(dir.path().join("reports.json"), "{not json").unwrap();

        assert!(matches!(store.reports(), Err(StoreError::Parse { .. })));
    }
}
