use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate;
use crate::config::Config;
use crate::dedup::{best_results, BestResultPolicy};
use crate::loader::{self, LoadIssue};
use crate::models::{
    BestResult, DailyAggregate, Metrics, Observation, SkillOutcomeDistribution, SkillPassSummary,
};

/// Which skills a view covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SkillFilter {
    #[default]
    All,
    Skill(String),
}

impl SkillFilter {
    pub fn from_option(skill: Option<String>) -> Self {
        match skill {
            Some(name) if !name.trim().is_empty() => SkillFilter::Skill(name),
            _ => SkillFilter::All,
        }
    }

    pub fn matches(&self, skill: &str) -> bool {
        match self {
            SkillFilter::All => true,
            SkillFilter::Skill(name) => name == skill,
        }
    }
}

impl fmt::Display for SkillFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillFilter::All => f.write_str("all skills"),
            SkillFilter::Skill(name) => f.write_str(name),
        }
    }
}

/// The prepared, unfiltered data behind every view.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub observations: Vec<Observation>,
    pub best_results: Vec<BestResult>,
    pub distribution: Vec<SkillOutcomeDistribution>,
    pub daily: Vec<DailyAggregate>,
    pub issues: Vec<LoadIssue>,
    pub files_loaded: usize,
}

impl Dataset {
    pub fn load(paths: &[PathBuf], config: &Config) -> Self {
        let outcome = loader::load_files(paths, config);
        info!(
            files = outcome.files_loaded,
            skipped = outcome.issues.len(),
            observations = outcome.observations.len(),
            "combined exports"
        );

        let mut dataset = Dataset::prepare(outcome.observations, config.best_result_policy);
        dataset.issues = outcome.issues;
        dataset.files_loaded = outcome.files_loaded;
        dataset
    }

    /// Derives the best results and aggregates. With no observations every
    /// derived table stays empty.
    pub fn prepare(observations: Vec<Observation>, policy: BestResultPolicy) -> Self {
        if observations.is_empty() {
            return Dataset::default();
        }

        let best_results = best_results(&observations, policy);
        let distribution = aggregate::skill_distribution(&best_results);
        let daily = aggregate::daily_aggregates(&observations);
        debug!(
            best_results = best_results.len(),
            days = daily.len(),
            "prepared dataset"
        );

        Dataset {
            observations,
            best_results,
            distribution,
            daily,
            issues: Vec::new(),
            files_loaded: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.best_results.is_empty()
    }

    /// Distinct skill names in alphabetical order.
    pub fn skills(&self) -> Vec<String> {
        self.best_results
            .iter()
            .map(|result| result.skill.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn view(&self, filter: &SkillFilter) -> DashboardView {
        match filter {
            SkillFilter::All => DashboardView {
                filter: filter.to_string(),
                metrics: aggregate::metrics(&self.observations),
                daily: self.daily.clone(),
                distribution: Some(self.distribution.clone()),
                pass_summary: Some(aggregate::skill_pass_summary(&self.best_results)),
            },
            SkillFilter::Skill(_) => {
                let selected: Vec<&Observation> = self
                    .observations
                    .iter()
                    .filter(|observation| filter.matches(&observation.skill))
                    .collect();

                DashboardView {
                    filter: filter.to_string(),
                    metrics: aggregate::metrics(selected.iter().copied()),
                    daily: aggregate::daily_aggregates(selected.iter().copied()),
                    distribution: None,
                    pass_summary: None,
                }
            }
        }
    }
}

/// Everything the presentation layer renders for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filter: String,
    pub metrics: Metrics,
    pub daily: Vec<DailyAggregate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<SkillOutcomeDistribution>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_summary: Option<Vec<SkillPassSummary>>,
}

/// Holds one prepared dataset for the file list and configuration it was
/// loaded with. A different list or configuration reloads.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    paths: Vec<PathBuf>,
    config: Config,
    dataset: Dataset,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, paths: &[PathBuf], config: &Config) -> &Dataset {
        if !self.is_cached(paths, config) {
            self.entry = None;
        }

        let entry = self.entry.get_or_insert_with(|| {
            debug!(files = paths.len(), "loading dataset into cache");
            CacheEntry {
                paths: paths.to_vec(),
                config: config.clone(),
                dataset: Dataset::load(paths, config),
            }
        });
        &entry.dataset
    }

    pub fn is_cached(&self, paths: &[PathBuf], config: &Config) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| entry.paths.as_slice() == paths && entry.config == *config)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeLevel;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use tempfile::tempdir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn observation(student: &str, skill: &str, timestamp: NaiveDateTime, level: OutcomeLevel) -> Observation {
        Observation {
            student: student.to_string(),
            skill: skill.to_string(),
            timestamp,
            level,
            passed: level.is_pass(),
            source: PathBuf::from("xp.csv"),
        }
    }

    fn sample() -> Dataset {
        Dataset::prepare(
            vec![
                observation("a@example.com", "Python", at(5, 9), OutcomeLevel::Bronze),
                observation("a@example.com", "Python", at(6, 9), OutcomeLevel::Unvalidated),
                observation("b@example.com", "SQL", at(5, 10), OutcomeLevel::Gold),
                observation("c@example.com", "SQL", at(13, 10), OutcomeLevel::Unvalidated),
            ],
            BestResultPolicy::HighestRank,
        )
    }

    #[test]
    fn all_skills_view_has_every_table() {
        let dataset = sample();
        let view = dataset.view(&SkillFilter::All);

        assert_eq!(view.filter, "all skills");
        assert_eq!(view.metrics.total_attempts, 4);
        assert_eq!(view.metrics.total_passes, 2);
        assert_eq!(view.daily.len(), 3);
        assert_eq!(view.distribution.as_ref().map(Vec::len), Some(8));
        assert_eq!(view.pass_summary.as_ref().map(Vec::len), Some(2));
        assert_eq!(dataset.skills(), vec!["Python".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn skill_view_is_restricted_and_omits_distribution() {
        let dataset = sample();
        let view = dataset.view(&SkillFilter::Skill("SQL".to_string()));

        assert_eq!(view.filter, "SQL");
        assert_eq!(view.metrics.total_attempts, 2);
        assert_eq!(view.metrics.total_passes, 1);
        assert_eq!(view.metrics.pass_rate, Some(50.0));
        let dates: Vec<NaiveDate> = view.daily.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![at(5, 0).date(), at(13, 0).date()]);
        assert!(view.distribution.is_none());
        assert!(view.pass_summary.is_none());
    }

    #[test]
    fn unknown_skill_view_is_empty_not_an_error() {
        let view = sample().view(&SkillFilter::Skill("Cobol".to_string()));
        assert_eq!(view.metrics.total_attempts, 0);
        assert_eq!(view.metrics.pass_rate, None);
        assert!(view.daily.is_empty());
    }

    #[test]
    fn blank_filter_means_all_skills() {
        assert_eq!(SkillFilter::from_option(None), SkillFilter::All);
        assert_eq!(SkillFilter::from_option(Some(" ".to_string())), SkillFilter::All);
        assert_eq!(
            SkillFilter::from_option(Some("SQL".to_string())),
            SkillFilter::Skill("SQL".to_string())
        );
    }

    #[test]
    fn no_readable_files_gives_empty_dataset() {
        let dir = tempdir().unwrap();
        let paths = vec![dir.path().join("xp_a.xlsx"), dir.path().join("xp_b.xlsx")];

        let dataset = Dataset::load(&paths, &Config::default());
        assert!(dataset.is_empty());
        assert!(dataset.distribution.is_empty());
        assert!(dataset.daily.is_empty());
        assert_eq!(dataset.issues.len(), 2);
        assert_eq!(dataset.files_loaded, 0);

        let view = dataset.view(&SkillFilter::All);
        assert_eq!(view.metrics.total_attempts, 0);
    }

    #[test]
    fn cache_reuses_dataset_for_same_file_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xp.csv");
        fs::write(
            &path,
            "Mail,Compétence,Date,Heure,xp\na@example.com,Python,2026-01-05,09:00,Or\n",
        )
        .unwrap();
        let paths = vec![path.clone()];
        let config = Config::default();

        let mut cache = DatasetCache::new();
        assert!(!cache.is_cached(&paths, &config));
        assert_eq!(cache.get_or_load(&paths, &config).observations.len(), 1);
        assert!(cache.is_cached(&paths, &config));

        fs::write(
            &path,
            "Mail,Compétence,Date,Heure,xp\na@example.com,Python,2026-01-05,09:00,Or\nb@example.com,SQL,2026-01-06,10:00,Bronze\n",
        )
        .unwrap();
        assert_eq!(cache.get_or_load(&paths, &config).observations.len(), 1);

        cache.invalidate();
        assert!(!cache.is_cached(&paths, &config));
        assert_eq!(cache.get_or_load(&paths, &config).observations.len(), 2);

        let other = vec![dir.path().join("missing.csv")];
        assert!(cache.get_or_load(&other, &config).is_empty());
        assert!(!cache.is_cached(&paths, &config));
    }

    #[test]
    fn cache_reloads_when_config_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xp.csv");
        fs::write(
            &path,
            "Mail,Compétence,Date,Heure,xp\na@example.com,Python,2026-01-05,09:00,Or\na@example.com,Python,2026-01-05,10:00,Bronze\n",
        )
        .unwrap();
        let paths = vec![path];
        let highest = Config::default();
        let latest = Config {
            best_result_policy: BestResultPolicy::LatestAttempt,
            ..Config::default()
        };

        let mut cache = DatasetCache::new();
        assert_eq!(cache.get_or_load(&paths, &highest).best_results[0].level, OutcomeLevel::Gold);
        assert!(!cache.is_cached(&paths, &latest));
        assert_eq!(cache.get_or_load(&paths, &latest).best_results[0].level, OutcomeLevel::Bronze);
        assert!(cache.is_cached(&paths, &latest));
        assert!(!cache.is_cached(&paths, &highest));
    }
}
