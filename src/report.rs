use std::fmt::Write;

use serde::Serialize;

use crate::dashboard::{DashboardView, Dataset, SkillFilter};
use crate::loader::LoadIssue;
use crate::models::{format_rate, BestResult, OutcomeLevel};

pub const NO_DATA_MESSAGE: &str =
    "No data could be loaded. Check that the export files are present and readable.";

fn write_issues(output: &mut String, issues: &[LoadIssue]) {
    if issues.is_empty() {
        return;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Skipped Files");
    for issue in issues {
        let _ = writeln!(output, "- {}", issue.describe());
    }
}

pub fn build_report(dataset: &Dataset, filter: &SkillFilter) -> String {
    let mut output = String::new();

    if dataset.is_empty() {
        let _ = writeln!(output, "# SkillQuest Dashboard");
        let _ = writeln!(output);
        let _ = writeln!(output, "**Error:** {NO_DATA_MESSAGE}");
        write_issues(&mut output, &dataset.issues);
        return output;
    }

    let view = dataset.view(filter);

    let _ = writeln!(output, "# SkillQuest Progress Summary");
    let _ = writeln!(
        output,
        "Generated for {} from {} export files",
        view.filter, dataset.files_loaded
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Indicators");
    let _ = writeln!(output, "- Total attempts recorded: {}", view.metrics.total_attempts);
    let _ = writeln!(output, "- Total validations (Bronze+): {}", view.metrics.total_passes);
    let _ = writeln!(output, "- Overall validation rate: {}", format_rate(view.metrics.pass_rate));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Activity");

    if view.daily.is_empty() {
        let _ = writeln!(output, "No attempts recorded for {}.", view.filter);
    } else {
        let _ = writeln!(
            output,
            "| Date | Attempts | Validations | Daily rate | Cumulative attempts | Cumulative validations | Cumulative rate |"
        );
        let _ = writeln!(output, "|---|---:|---:|---:|---:|---:|---:|");
        for day in view.daily.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} |",
                day.date,
                day.attempts,
                day.passes,
                format_rate(day.daily_pass_rate),
                day.cumulative_attempts,
                day.cumulative_passes,
                format_rate(day.cumulative_pass_rate)
            );
        }
    }

    if let Some(distribution) = &view.distribution {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Level Distribution by Skill");
        let levels = OutcomeLevel::DISPLAY_ORDER
            .iter()
            .map(|level| level.label())
            .collect::<Vec<_>>()
            .join(" | ");
        let _ = writeln!(output, "| Skill | {levels} |");
        let _ = writeln!(output, "|---|---:|---:|---:|---:|");
        for row in distribution.chunks(OutcomeLevel::DISPLAY_ORDER.len()) {
            let counts = row
                .iter()
                .map(|cell| cell.students.to_string())
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = writeln!(output, "| {} | {counts} |", row[0].skill);
        }
    }

    if let Some(summary) = &view.pass_summary {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Validation Rate by Skill");
        let _ = writeln!(output, "| Skill | Students | Validations (Bronze+) | Validation rate |");
        let _ = writeln!(output, "|---|---:|---:|---:|");
        for skill in summary.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                skill.skill,
                skill.students,
                skill.validations,
                format_rate(skill.pass_rate)
            );
        }
    }

    write_issues(&mut output, &dataset.issues);
    output
}

/// Short plain-text version of the indicators for the terminal.
pub fn build_summary(dataset: &Dataset, filter: &SkillFilter) -> String {
    let mut output = String::new();

    if dataset.is_empty() {
        let _ = writeln!(output, "{NO_DATA_MESSAGE}");
        for issue in dataset.issues.iter() {
            let _ = writeln!(output, "- {}", issue.describe());
        }
        return output;
    }

    let view = dataset.view(filter);
    let _ = writeln!(output, "Indicators for {}:", view.filter);
    let _ = writeln!(
        output,
        "- {} attempts, {} validations, {} validation rate",
        view.metrics.total_attempts,
        view.metrics.total_passes,
        format_rate(view.metrics.pass_rate)
    );

    match view.daily.last() {
        Some(day) => {
            let _ = writeln!(
                output,
                "- last activity on {}: {} attempts, {} validations",
                day.date, day.attempts, day.passes
            );
        }
        None => {
            let _ = writeln!(output, "- no attempts recorded");
        }
    }

    if !dataset.issues.is_empty() {
        let _ = writeln!(output, "- {} export files skipped", dataset.issues.len());
    }

    output
}

#[derive(Serialize)]
struct JsonReport {
    #[serde(flatten)]
    view: Option<DashboardView>,
    error: Option<&'static str>,
    skipped_files: Vec<String>,
}

pub fn build_json(dataset: &Dataset, filter: &SkillFilter) -> serde_json::Result<String> {
    let report = if dataset.is_empty() {
        JsonReport {
            view: None,
            error: Some(NO_DATA_MESSAGE),
            skipped_files: dataset.issues.iter().map(LoadIssue::describe).collect(),
        }
    } else {
        JsonReport {
            view: Some(dataset.view(filter)),
            error: None,
            skipped_files: dataset.issues.iter().map(LoadIssue::describe).collect(),
        }
    };
    serde_json::to_string_pretty(&report)
}

pub fn write_best_results<W: std::io::Write>(writer: W, results: &[BestResult]) -> csv::Result<()> {
    #[derive(Serialize)]
    struct CsvRow<'a> {
        student: &'a str,
        skill: &'a str,
        timestamp: String,
        level: &'static str,
        rank: u8,
        passed: bool,
    }

    let mut writer = csv::Writer::from_writer(writer);
    for result in results {
        writer.serialize(CsvRow {
            student: &result.student,
            skill: &result.skill,
            timestamp: result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            level: result.level.label(),
            rank: result.level.rank(),
            passed: result.passed,
        })?;
    }
    writer.flush()?;
    Ok(())
}
