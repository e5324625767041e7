//! Percentage classification.
//!
//! Two independent ladders live here: the seven performance bands used in
//! reports and statistics, and the five progress-bar colors used for display.
//! They have different thresholds and must stay separate.

use serde::{Deserialize, Serialize};
use std::fmt;

fn normalize(percentage: f64) -> f64 {
    if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    }
}

/// Performance band of a percentage. Ordered ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "band_0_30")]
    Band0To30,
    #[serde(rename = "band_31_40")]
    Band31To40,
    #[serde(rename = "band_41_60")]
    Band41To60,
    #[serde(rename = "band_61_74")]
    Band61To74,
    #[serde(rename = "band_75_80")]
    Band75To80,
    #[serde(rename = "band_81_89")]
    Band81To89,
    #[serde(rename = "band_90_100")]
    Band90To100,
}

impl Band {
    /// All bands, ascending.
    pub const ALL: [Band; 7] = [
        Band::Band0To30,
        Band::Band31To40,
        Band::Band41To60,
        Band::Band61To74,
        Band::Band75To80,
        Band::Band81To89,
        Band::Band90To100,
    ];

    /// Classify a percentage. Upper bounds are inclusive.
    pub fn from_percentage(percentage: f64) -> Self {
        let p = normalize(percentage);

        if p <= 30.0 {
            Band::Band0To30
        } else if p <= 40.0 {
            Band::Band31To40
        } else if p <= 60.0 {
            Band::Band41To60
        } else if p <= 74.0 {
            Band::Band61To74
        } else if p <= 80.0 {
            Band::Band75To80
        } else if p <= 89.0 {
            Band::Band81To89
        } else {
            Band::Band90To100
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Band::Band0To30 => "band_0_30",
            Band::Band31To40 => "band_31_40",
            Band::Band41To60 => "band_41_60",
            Band::Band61To74 => "band_61_74",
            Band::Band75To80 => "band_75_80",
            Band::Band81To89 => "band_81_89",
            Band::Band90To100 => "band_90_100",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::Band0To30 => "Needs urgent support",
            Band::Band31To40 => "Weak",
            Band::Band41To60 => "Acceptable",
            Band::Band61To74 => "Good",
            Band::Band75To80 => "Very good",
            Band::Band81To89 => "Excellent",
            Band::Band90To100 => "Outstanding",
        }
    }

    /// Percentage range covered, for headings.
    pub fn range(&self) -> &'static str {
        match self {
            Band::Band0To30 => "0-30%",
            Band::Band31To40 => "31-40%",
            Band::Band41To60 => "41-60%",
            Band::Band61To74 => "61-74%",
            Band::Band75To80 => "75-80%",
            Band::Band81To89 => "81-89%",
            Band::Band90To100 => "90-100%",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.range())
    }
}

/// Progress-bar color. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressColor {
    Red,
    Yellow,
    Orange,
    Blue,
    Green,
}

impl ProgressColor {
    pub fn from_percentage(percentage: f64) -> Self {
        let p = normalize(percentage);

        if p < 26.0 {
            ProgressColor::Red
        } else if p < 51.0 {
            ProgressColor::Yellow
        } else if p < 76.0 {
            ProgressColor::Orange
        } else if p < 90.0 {
            ProgressColor::Blue
        } else {
            ProgressColor::Green
        }
    }

    /// Returns an emoji representation of the color.
    pub fn emoji(&self) -> &'static str {
        match self {
            ProgressColor::Red => "🔴",
            ProgressColor::Yellow => "🟡",
            ProgressColor::Orange => "🟠",
            ProgressColor::Blue => "🔵",
            ProgressColor::Green => "🟢",
        }
    }
}

impl fmt::Display for ProgressColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressColor::Red => write!(f, "red"),
            ProgressColor::Yellow => write!(f, "yellow"),
            ProgressColor::Orange => write!(f, "orange"),
            ProgressColor::Blue => write!(f, "blue"),
            ProgressColor::Green => write!(f, "green"),
        }
    }
}

/// Text progress bar of `width` cells, prefixed with the color emoji.
pub fn progress_bar(percentage: f64, width: usize) -> String {
    let p = normalize(percentage);
    let filled = ((p / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);

    format!(
        "{} {}{} {:>5.1}%",
        ProgressColor::from_percentage(p).emoji(),
        "█".repeat(filled),
        "░".repeat(width - filled),
        p
    )
}
