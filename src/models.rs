//! Data models for observation reports.
//!
//! This module contains the core data structures used throughout
//! the application for representing teachers, rubric criteria, and
//! completed evaluation reports.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Highest score a single criterion can receive.
pub const MAX_SCORE: u8 = 4;

/// Clamp a raw score into `0..=MAX_SCORE`.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, MAX_SCORE as i64) as u8
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_score(raw))
}

/// A single rubric item with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Display label. Not guaranteed to be unique within a report.
    pub label: String,
    /// Score in `0..=4`. Out-of-range input is clamped on load.
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
}

impl Criterion {
    /// Creates a criterion, clamping the raw score into range.
    pub fn new(label: impl Into<String>, raw_score: i64) -> Self {
        Self {
            label: label.into(),
            score: clamp_score(raw_score),
        }
    }
}

/// A named group of criteria (class-session rubrics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionGroup {
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

/// Kind of evaluation, without its payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    General,
    ClassSession,
    Special,
}

impl fmt::Display for EvaluationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationKind::General => write!(f, "General"),
            EvaluationKind::ClassSession => write!(f, "Class session"),
            EvaluationKind::Special => write!(f, "Special"),
        }
    }
}

impl EvaluationKind {
    /// Stable key used in files and CSV columns.
    pub fn key(&self) -> &'static str {
        match self {
            EvaluationKind::General => "general",
            EvaluationKind::ClassSession => "class_session",
            EvaluationKind::Special => "special",
        }
    }

    /// Parses a stored key. Accepts dashes as well as underscores.
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "general" => Some(EvaluationKind::General),
            "class_session" | "class" | "session" => Some(EvaluationKind::ClassSession),
            "special" => Some(EvaluationKind::Special),
            _ => None,
        }
    }
}

/// Evaluation payload. The shape depends on the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Evaluation {
    /// General evaluation with a flat rubric.
    General {
        #[serde(default)]
        criteria: Vec<Criterion>,
    },
    /// Classroom visit, rubric nested under named groups.
    ClassSession {
        #[serde(default)]
        subject: String,
        #[serde(default)]
        class_name: String,
        #[serde(default)]
        groups: Vec<CriterionGroup>,
    },
    /// Special-purpose evaluation with its own title.
    Special {
        #[serde(default)]
        title: String,
        #[serde(default)]
        criteria: Vec<Criterion>,
    },
}

impl Evaluation {
    pub fn kind(&self) -> EvaluationKind {
        match self {
            Evaluation::General { .. } => EvaluationKind::General,
            Evaluation::ClassSession { .. } => EvaluationKind::ClassSession,
            Evaluation::Special { .. } => EvaluationKind::Special,
        }
    }

    /// Every criterion in rubric order, with grouping flattened away.
    pub fn criteria(&self) -> Vec<&Criterion> {
        match self {
            Evaluation::General { criteria } | Evaluation::Special { criteria, .. } => {
                criteria.iter().collect()
            }
            Evaluation::ClassSession { groups, .. } => {
                groups.iter().flat_map(|g| g.criteria.iter()).collect()
            }
        }
    }

    /// Every leaf score.
    pub fn scores(&self) -> Vec<u8> {
        self.criteria().into_iter().map(|c| c.score).collect()
    }

    /// Short heading: the special title or the class-session subject.
    pub fn heading(&self) -> Option<&str> {
        let heading = match self {
            Evaluation::General { .. } => return None,
            Evaluation::ClassSession { subject, .. } => subject.as_str(),
            Evaluation::Special { title, .. } => title.as_str(),
        };
        if heading.is_empty() {
            None
        } else {
            Some(heading)
        }
    }
}

/// One completed evaluation of a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Identifier of the evaluated teacher.
    pub teacher_id: String,
    /// Date of the observation.
    pub date: NaiveDate,
    /// Free-form supervisor notes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

impl Report {
    /// Creates a new report with a fresh id and no notes.
    pub fn new(teacher_id: impl Into<String>, date: NaiveDate, evaluation: Evaluation) -> Self {
        Self {
            id: Uuid::new_v4(),
            teacher_id: teacher_id.into(),
            date,
            notes: String::new(),
            evaluation,
        }
    }

    pub fn kind(&self) -> EvaluationKind {
        self.evaluation.kind()
    }

    /// First eight characters of the id, for terminal listings.
    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }
}

/// First eight hex digits of a report id.
pub fn short_id(id: &Uuid) -> String {
    let mut simple = id.simple().to_string();
    simple.truncate(8);
    simple
}

/// A teacher on the school roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Resolve a teacher id to a display name, falling back to the id.
pub fn teacher_name<'a>(teachers: &'a [Teacher], teacher_id: &'a str) -> &'a str {
    teachers
        .iter()
        .find(|t| t.id == teacher_id)
        .map(|t| t.name.as_str())
        .unwrap_or(teacher_id)
}
