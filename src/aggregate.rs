use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::models::{
    rate, BestResult, DailyAggregate, Metrics, Observation, OutcomeLevel, SkillOutcomeDistribution,
    SkillPassSummary,
};

/// Attempts and passes per calendar day with running totals, oldest first.
pub fn daily_aggregates<'a, I>(observations: I) -> Vec<DailyAggregate>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut by_day: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for observation in observations {
        let entry = by_day.entry(observation.date()).or_insert((0, 0));
        entry.0 += 1;
        if observation.passed {
            entry.1 += 1;
        }
    }

    let mut cumulative_attempts = 0;
    let mut cumulative_passes = 0;
    by_day
        .into_iter()
        .map(|(date, (attempts, passes))| {
            cumulative_attempts += attempts;
            cumulative_passes += passes;
            DailyAggregate {
                date,
                attempts,
                passes,
                cumulative_attempts,
                cumulative_passes,
                daily_pass_rate: rate(passes, attempts),
                cumulative_pass_rate: rate(cumulative_passes, cumulative_attempts),
            }
        })
        .collect()
}

/// Student counts per (skill, level), with every level present for every
/// skill.
pub fn skill_distribution<'a, I>(best: I) -> Vec<SkillOutcomeDistribution>
where
    I: IntoIterator<Item = &'a BestResult>,
{
    let mut skills: BTreeSet<&str> = BTreeSet::new();
    let mut counts: HashMap<(&str, OutcomeLevel), u64> = HashMap::new();

    for result in best {
        skills.insert(result.skill.as_str());
        *counts.entry((result.skill.as_str(), result.level)).or_insert(0) += 1;
    }

    skills
        .into_iter()
        .flat_map(|skill| {
            let counts = &counts;
            OutcomeLevel::DISPLAY_ORDER
                .into_iter()
                .map(move |level| SkillOutcomeDistribution {
                    skill: skill.to_string(),
                    level,
                    students: counts.get(&(skill, level)).copied().unwrap_or(0),
                })
        })
        .collect()
}

/// Validation rate per skill over best results, most validations first.
pub fn skill_pass_summary<'a, I>(best: I) -> Vec<SkillPassSummary>
where
    I: IntoIterator<Item = &'a BestResult>,
{
    let mut map: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for result in best {
        let entry = map.entry(result.skill.as_str()).or_insert((0, 0));
        entry.0 += 1;
        if result.passed {
            entry.1 += 1;
        }
    }

    let mut summaries: Vec<SkillPassSummary> = map
        .into_iter()
        .map(|(skill, (students, validations))| SkillPassSummary {
            skill: skill.to_string(),
            students,
            validations,
            pass_rate: rate(validations, students),
        })
        .collect();

    summaries.sort_by(|a, b| b.validations.cmp(&a.validations).then_with(|| a.skill.cmp(&b.skill)));
    summaries
}

pub fn metrics<'a, I>(observations: I) -> Metrics
where
    I: IntoIterator<Item = &'a Observation>,
{
    let (total_attempts, total_passes) = observations
        .into_iter()
        .fold((0, 0), |(attempts, passes), observation| {
            (attempts + 1, passes + u64::from(observation.passed))
        });

    Metrics {
        total_attempts,
        total_passes,
        pass_rate: rate(total_passes, total_attempts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::path::PathBuf;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, day)
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

    fn best(student: &str, skill: &str, level: OutcomeLevel) -> BestResult {
        BestResult::from(&observation(student, skill, at(3, 9), level))
    }

    fn sample() -> Vec<Observation> {
        vec![
            observation("a@example.com", "Python", at(5, 9), OutcomeLevel::Bronze),
            observation("b@example.com", "Python", at(3, 9), OutcomeLevel::Unvalidated),
            observation("c@example.com", "SQL", at(3, 14), OutcomeLevel::Gold),
            observation("a@example.com", "SQL", at(5, 16), OutcomeLevel::Unvalidated),
            observation("b@example.com", "SQL", at(17, 8), OutcomeLevel::Silver),
        ]
    }

    #[test]
    fn daily_counts_and_running_totals() {
        let daily = daily_aggregates(&sample());
        let dates: Vec<NaiveDate> = daily.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![at(3, 0).date(), at(5, 0).date(), at(17, 0).date()]
        );

        assert_eq!((daily[0].attempts, daily[0].passes), (2, 1));
        assert_eq!((daily[1].attempts, daily[1].passes), (2, 1));
        assert_eq!((daily[2].attempts, daily[2].passes), (1, 1));
        assert_eq!(daily[2].cumulative_attempts, 5);
        assert_eq!(daily[2].cumulative_passes, 3);
        assert_eq!(daily[0].daily_pass_rate, Some(50.0));
        assert_eq!(daily[2].daily_pass_rate, Some(100.0));
        assert_eq!(daily[2].cumulative_pass_rate, Some(60.0));
    }

    #[test]
    fn cumulative_fields_never_decrease_and_sum_up() {
        let daily = daily_aggregates(&sample());
        for pair in daily.windows(2) {
            assert!(pair[0].cumulative_attempts <= pair[1].cumulative_attempts);
            assert!(pair[0].cumulative_passes <= pair[1].cumulative_passes);
        }

        let last = daily.last().unwrap();
        assert_eq!(last.cumulative_attempts, daily.iter().map(|d| d.attempts).sum::<u64>());
        assert_eq!(last.cumulative_passes, daily.iter().map(|d| d.passes).sum::<u64>());
    }

    #[test]
    fn no_observations_means_no_days() {
        assert!(daily_aggregates(std::iter::empty()).is_empty());
    }

    #[test]
    fn distribution_is_zero_filled_per_skill() {
        let results = vec![
            best("a@example.com", "Python", OutcomeLevel::Bronze),
            best("b@example.com", "Python", OutcomeLevel::Bronze),
            best("c@example.com", "SQL", OutcomeLevel::Gold),
        ];

        let distribution = skill_distribution(&results);
        assert_eq!(distribution.len(), 8);

        let python: Vec<(OutcomeLevel, u64)> = distribution
            .iter()
            .filter(|row| row.skill == "Python")
            .map(|row| (row.level, row.students))
            .collect();
        assert_eq!(
            python,
            vec![
                (OutcomeLevel::Gold, 0),
                (OutcomeLevel::Silver, 0),
                (OutcomeLevel::Bronze, 2),
                (OutcomeLevel::Unvalidated, 0),
            ]
        );

        for skill in ["Python", "SQL"] {
            let total: u64 = distribution
                .iter()
                .filter(|row| row.skill == skill)
                .map(|row| row.students)
                .sum();
            let expected = results.iter().filter(|r| r.skill == skill).count() as u64;
            assert_eq!(total, expected);
        }
    }

    #[test]
    fn pass_summary_orders_by_validations() {
        let results = vec![
            best("a@example.com", "Python", OutcomeLevel::Unvalidated),
            best("b@example.com", "Python", OutcomeLevel::Bronze),
            best("a@example.com", "SQL", OutcomeLevel::Gold),
            best("b@example.com", "SQL", OutcomeLevel::Silver),
            best("c@example.com", "Docker", OutcomeLevel::Unvalidated),
        ];

        let summary = skill_pass_summary(&results);
        let skills: Vec<&str> = summary.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(skills, vec!["SQL", "Python", "Docker"]);
        assert_eq!(summary[0].pass_rate, Some(100.0));
        assert_eq!(summary[1].students, 2);
        assert_eq!(summary[1].pass_rate, Some(50.0));
        assert_eq!(summary[2].validations, 0);
        assert_eq!(summary[2].pass_rate, Some(0.0));
    }

    #[test]
    fn metrics_count_every_attempt() {
        let totals = metrics(&sample());
        assert_eq!(totals.total_attempts, 5);
        assert_eq!(totals.total_passes, 3);
        assert_eq!(totals.pass_rate, Some(60.0));

        let empty = metrics(std::iter::empty());
        assert_eq!(empty.total_attempts, 0);
        assert_eq!(empty.pass_rate, None);
    }
}
