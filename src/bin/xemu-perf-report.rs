//! Command line entry point: ranks versions, writes the site data file, or
//! cleans result files.

use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xemu_perf_report::{
    analyze_runs, load_results,
    rank::{rank_versions, render_ranking},
    report::ReportData,
    suite::SuiteRegistry,
    AnalysisConfig, TrendLabel,
};

#[derive(Debug, Parser)]
#[command(name = "xemu-perf-report", version)]
#[command(about = "Normalizes xemu perf tester results and classifies performance trends")]
struct Cli {
    /// Enables verbose logging information.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Optional YAML analysis config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank versions by mean normalized performance.
    Analyze {
        /// Path(s) to the root of the results to process.
        #[arg(required = true)]
        results: Vec<PathBuf>,
        /// Optional machine-readable ranking (JSON).
        #[arg(long)]
        output_json: Option<PathBuf>,
    },
    /// Write flattened, trend-annotated results as the site data file.
    Flatten {
        /// Path(s) to the root of the results to process.
        #[arg(required = true)]
        results: Vec<PathBuf>,
        /// Output JSON path.
        #[arg(long, short, default_value = "results_data.json")]
        output: PathBuf,
        /// Local copy of the test suite registry JSON.
        #[arg(long)]
        registry: Option<PathBuf>,
        /// Report title.
        #[arg(long)]
        title: Option<String>,
    },
    /// Remove known-bad tests from result files in place.
    Clean {
        /// Path(s) to the root of the results to clean.
        #[arg(required = true)]
        results: Vec<PathBuf>,
    },
}

impl Command {
    fn results(&self) -> &[PathBuf] {
        match self {
            Command::Analyze { results, .. }
            | Command::Flatten { results, .. }
            | Command::Clean { results } => results,
        }
    }
}

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:?}");
            std::process::exit(2);
        }
    }
}

fn try_main() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    for path in cli.command.results() {
        if !path.is_dir() {
            tracing::error!("Results directory '{}' does not exist", path.display());
            return Ok(1);
        }
    }

    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Command::Analyze {
            results,
            output_json,
        } => {
            let runs = load_results(&results).context("load results")?;
            let records = config
                .flattener()
                .flatten(&runs)
                .context("flatten results")?;
            let ranking = rank_versions(&records);
            print!("{}", render_ranking(&ranking));
            if let Some(path) = output_json {
                let buf = serde_json::to_vec_pretty(&ranking)?;
                fs::write(&path, buf)
                    .with_context(|| format!("write ranking {}", path.display()))?;
            }
        }
        Command::Flatten {
            results,
            output,
            registry,
            title,
        } => {
            let runs = load_results(&results).context("load results")?;
            let records = analyze_runs(&runs, &config).context("analyze results")?;

            let mut report = ReportData::new(&records);
            if let Some(title) = title {
                report = report.title(title);
            }
            if let Some(path) = registry {
                let registry = SuiteRegistry::from_file(&path)
                    .with_context(|| format!("load suite registry {}", path.display()))?;
                report = report.with_suite_descriptors(&registry);
            }
            report
                .write_json(&output)
                .with_context(|| format!("write report {}", output.display()))?;

            let mut counts: BTreeMap<TrendLabel, usize> = BTreeMap::new();
            for label in records.iter().filter_map(|r| r.trend) {
                *counts.entry(label).or_default() += 1;
            }
            println!("Wrote {} records to {}", records.len(), output.display());
            for (label, count) in counts {
                println!("  {}: {count}", label.as_str());
            }
        }
        Command::Clean { results } => {
            let summary = config.cleaner()?.clean_dirs(&results)?;
            println!(
                "Scanned {} file(s), updated {}, removed {} test result(s)",
                summary.files_scanned, summary.files_updated, summary.tests_removed
            );
        }
    }

    Ok(0)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
