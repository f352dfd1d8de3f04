use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::{BestResult, Observation};

/// How the single retained result per (student, skill) is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BestResultPolicy {
    /// Highest rank wins; the most recent attempt breaks rank ties.
    #[default]
    HighestRank,
    /// Most recent attempt wins; the lower rank is kept when two attempts
    /// share a timestamp.
    LatestAttempt,
}

impl BestResultPolicy {
    fn compare(self, a: &Observation, b: &Observation) -> Ordering {
        let pair = a
            .student
            .cmp(&b.student)
            .then_with(|| a.skill.cmp(&b.skill));

        match self {
            BestResultPolicy::HighestRank => pair
                .then_with(|| a.level.cmp(&b.level))
                .then_with(|| a.timestamp.cmp(&b.timestamp)),
            BestResultPolicy::LatestAttempt => pair
                .then_with(|| a.timestamp.cmp(&b.timestamp))
                .then_with(|| b.level.cmp(&a.level)),
        }
    }
}

/// Keeps one result per (student, skill): the last row of each group after a
/// stable sort, so exact ties resolve to the row loaded last.
pub fn best_results(observations: &[Observation], policy: BestResultPolicy) -> Vec<BestResult> {
    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by(|a, b| policy.compare(a, b));

    let mut best: Vec<BestResult> = Vec::new();
    for (position, observation) in sorted.iter().enumerate() {
        let last_of_group = sorted.get(position + 1).map_or(true, |next| {
            next.student != observation.student || next.skill != observation.skill
        });
        if last_of_group {
            best.push(BestResult::from(*observation));
        }
    }

    best
}
