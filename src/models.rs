use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Assessment tier awarded for one skill attempt, ordered by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeLevel {
    Unvalidated,
    Bronze,
    Silver,
    Gold,
}

impl OutcomeLevel {
    /// Display order used by distribution charts and tables.
    pub const DISPLAY_ORDER: [OutcomeLevel; 4] = [
        OutcomeLevel::Gold,
        OutcomeLevel::Silver,
        OutcomeLevel::Bronze,
        OutcomeLevel::Unvalidated,
    ];

    /// Maps an export label to a level. Blank, missing and unknown labels
    /// all count as not validated.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return OutcomeLevel::Unvalidated;
        };

        match label.trim().to_lowercase().as_str() {
            "or" | "gold" => OutcomeLevel::Gold,
            "argent" | "silver" => OutcomeLevel::Silver,
            "bronze" => OutcomeLevel::Bronze,
            _ => OutcomeLevel::Unvalidated,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            OutcomeLevel::Unvalidated => 0,
            OutcomeLevel::Bronze => 1,
            OutcomeLevel::Silver => 2,
            OutcomeLevel::Gold => 3,
        }
    }

    pub fn is_pass(self) -> bool {
        self.rank() >= OutcomeLevel::Bronze.rank()
    }

    /// Label as it appears in the SkillQuest exports.
    pub fn label(self) -> &'static str {
        match self {
            OutcomeLevel::Unvalidated => "Non validé",
            OutcomeLevel::Bronze => "Bronze",
            OutcomeLevel::Silver => "Argent",
            OutcomeLevel::Gold => "Or",
        }
    }
}

impl fmt::Display for OutcomeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub student: String,
    pub skill: String,
    pub timestamp: NaiveDateTime,
    pub level: OutcomeLevel,
    pub passed: bool,
    #[serde(skip)]
    pub source: PathBuf,
}

impl Observation {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestResult {
    pub student: String,
    pub skill: String,
    pub timestamp: NaiveDateTime,
    pub level: OutcomeLevel,
    pub passed: bool,
    #[serde(skip)]
    pub source: PathBuf,
}

impl From<&Observation> for BestResult {
    fn from(observation: &Observation) -> Self {
        BestResult {
            student: observation.student.clone(),
            skill: observation.skill.clone(),
            timestamp: observation.timestamp,
            level: observation.level,
            passed: observation.passed,
            source: observation.source.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub attempts: u64,
    pub passes: u64,
    pub cumulative_attempts: u64,
    pub cumulative_passes: u64,
    pub daily_pass_rate: Option<f64>,
    pub cumulative_pass_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillOutcomeDistribution {
    pub skill: String,
    pub level: OutcomeLevel,
    pub students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillPassSummary {
    pub skill: String,
    pub students: u64,
    pub validations: u64,
    pub pass_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_attempts: u64,
    pub total_passes: u64,
    pub pass_rate: Option<f64>,
}

/// Percentage of `part` over `whole`, undefined when `whole` is zero.
pub fn rate(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64 * 100.0)
    }
}

/// Display fallback for undefined rates.
pub fn format_rate(rate: Option<f64>) -> String {
    format!("{:.1}%", rate.unwrap_or(0.0))
}
