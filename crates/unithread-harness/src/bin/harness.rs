//! CLI entrypoint for the unithread conformance harness.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use unithread_harness::report::{ConformanceReport, HarnessError, ScenarioOutcome};
use unithread_harness::scenario;

/// Conformance tooling for unithread.
#[derive(Debug, Parser)]
#[command(name = "unithread-harness")]
#[command(about = "Conformance harness for the unithread portability layer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available scenarios.
    List,
    /// Run the scenario suite and render a report.
    Run {
        /// Run only the named scenario.
        #[arg(long)]
        scenario: Option<String>,
        /// Write the JSON report to this path (text always goes to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Campaign name recorded in the report.
        #[arg(long, default_value = "conformance")]
        campaign: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::List => {
            for scenario in scenario::all() {
                println!("{:32} {}", scenario.name, scenario.summary);
            }
            ExitCode::SUCCESS
        }
        Command::Run {
            scenario,
            output,
            campaign,
        } => match run_suite(scenario.as_deref(), output.as_deref(), &campaign) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(err) => {
                eprintln!("harness error: {err}");
                ExitCode::from(2)
            }
        },
    }
}

fn run_suite(
    only: Option<&str>,
    output: Option<&std::path::Path>,
    campaign: &str,
) -> Result<bool, HarnessError> {
    let suite = scenario::all();
    if let Some(name) = only {
        if !suite.iter().any(|s| s.name == name) {
            return Err(HarnessError::UnknownScenario(name.to_owned()));
        }
    }

    let outcomes: Vec<ScenarioOutcome> = suite
        .iter()
        .filter(|s| only.is_none_or(|name| s.name == name))
        .map(|s| {
            let result = s.run();
            ScenarioOutcome {
                name: s.name.to_owned(),
                summary: s.summary.to_owned(),
                passed: result.is_ok(),
                detail: result.err(),
            }
        })
        .collect();

    let report = ConformanceReport::from_outcomes(campaign, outcomes);
    print!("{}", report.render_text());

    if let Some(path) = output {
        std::fs::write(path, report.to_json()?)?;
    }
    Ok(report.all_passed())
}
