use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use skillquest_progress::config::Config;
use skillquest_progress::dashboard::{DatasetCache, SkillFilter};
use skillquest_progress::{logging, report};

#[derive(Parser)]
#[command(name = "skillquest-progress")]
#[command(about = "Progress and validation dashboard over SkillQuest xp exports", long_about = None)]
struct Cli {
    /// Config file (defaults to ./skillquest.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the export files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Export file to load instead of the configured list (repeatable)
    #[arg(long = "file", global = true)]
    files: Vec<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the headline indicators
    Summary {
        #[arg(long)]
        skill: Option<String>,
    },
    /// Generate a full report
    Report {
        #[arg(long)]
        skill: Option<String>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// List the skills present in the exports
    Skills,
    /// Export the best result per student and skill as CSV
    Best {
        #[arg(long)]
        skill: Option<String>,
        #[arg(long, default_value = "best_results.csv")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let paths = if cli.files.is_empty() {
        config.file_paths()
    } else {
        cli.files.iter().map(|file| config.data_dir.join(file)).collect()
    };

    let mut cache = DatasetCache::new();
    let dataset = cache.get_or_load(&paths, &config);

    match cli.command {
        Commands::Summary { skill } => {
            print!("{}", report::build_summary(dataset, &SkillFilter::from_option(skill)));
        }
        Commands::Report { skill, format, out } => {
            let filter = SkillFilter::from_option(skill);
            let rendered = match format {
                ReportFormat::Markdown => report::build_report(dataset, &filter),
                ReportFormat::Json => {
                    report::build_json(dataset, &filter).context("failed to render JSON report")?
                }
            };
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Skills => {
            if dataset.is_empty() {
                println!("{}", report::NO_DATA_MESSAGE);
                return Ok(());
            }

            for skill in dataset.skills() {
                println!("{skill}");
            }
        }
        Commands::Best { skill, out } => {
            if dataset.is_empty() {
                println!("{}", report::NO_DATA_MESSAGE);
                return Ok(());
            }

            let filter = SkillFilter::from_option(skill);
            let results: Vec<_> = dataset
                .best_results
                .iter()
                .filter(|result| filter.matches(&result.skill))
                .cloned()
                .collect();
            let file = File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_best_results(file, &results).context("failed to write best results")?;
            println!("Wrote {} best results to {}.", results.len(), out.display());
        }
    }

    Ok(())
}
