//! Shiftwise command-line interface.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use shiftwise_core::{validate_raw, Preset, ProblemContext, ScheduleRequest};
use shiftwise_engine::{EngineConfig, Pipeline};

#[derive(Parser)]
#[command(name = "shiftwise", version, about = "Constraint-based staff shift scheduling")]
struct Cli {
    /// Emit machine-readable JSON instead of a human summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a schedule from a request file.
    Solve {
        /// Request file (.yaml, .yml, or .json).
        input: PathBuf,

        /// Solver preset: quick, balanced, best, or a comma-separated
        /// solver list.
        #[arg(long)]
        preset: Option<String>,

        /// Write the full outcome as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a request file and its existing schedule against the
    /// constraints without solving.
    Validate {
        /// Request file (.yaml, .yml, or .json).
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(ok) => {
            if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Solve {
            input,
            preset,
            output,
        } => solve(&input, preset, output.as_deref(), cli.json).await,
        Command::Validate { input } => validate(&input, cli.json),
    }
}

fn load_request(path: &Path) -> Result<ScheduleRequest> {
    let request = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ScheduleRequest::from_yaml_file(path),
        Some("json") => ScheduleRequest::from_json_file(path),
        other => bail!(
            "unsupported request format {:?}; expected .yaml, .yml, or .json",
            other
        ),
    };
    request.with_context(|| format!("failed to load request from {}", path.display()))
}

async fn solve(
    input: &Path,
    preset: Option<String>,
    output: Option<&Path>,
    json: bool,
) -> Result<bool> {
    let mut request = load_request(input)?;
    if let Some(preset) = preset {
        request.preset = parse_preset(&preset);
    }

    let pipeline = Pipeline::new(EngineConfig::default());
    let outcome = pipeline.run(&request).await;

    if let Some(path) = output {
        let serialized = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, serialized)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }

    Ok(outcome.success)
}

fn parse_preset(raw: &str) -> Preset {
    match raw {
        "quick" => Preset::Quick,
        "balanced" => Preset::Balanced,
        "best" => Preset::Best,
        other => Preset::Custom(other.to_string()),
    }
}

fn print_summary(outcome: &shiftwise_engine::PipelineOutcome) {
    if outcome.metadata.fallback {
        println!("FALLBACK: no new schedule could be generated");
    } else {
        println!(
            "Schedule generated: fitness {:.1}, confidence {:.2}",
            outcome.fitness, outcome.overall_confidence
        );
    }
    if let Some(error) = &outcome.error {
        println!("  error: {}", error);
    }
    for recommendation in &outcome.recommendations {
        println!("  {}", recommendation.message);
    }

    if let Some(validation) = &outcome.validation {
        println!(
            "  valid: {} ({} violations)",
            validation.valid,
            validation.violations.len()
        );
        for recommendation in &validation.recommendations {
            println!("  - {}", recommendation);
        }
    }
    if let Some(confidence) = &outcome.confidence {
        println!("  confidence level: {}", confidence.level);
        for risk in &confidence.risk_factors {
            println!("  ! {}", risk);
        }
    }
    if !outcome.alternatives.is_empty() {
        println!("  alternatives: {}", outcome.alternatives.len());
    }
    println!(
        "  run {} finished in {} ms",
        outcome.metadata.run_id, outcome.metadata.elapsed_ms
    );
}

fn validate(input: &Path, json: bool) -> Result<bool> {
    let request = load_request(input)?;
    request.validate().context("request failed validation")?;

    let ctx = ProblemContext::analyze(
        request.staff_ids(),
        request.dates.clone(),
        &request.constraints,
    );
    let seed = request.existing_schedule.to_solution(&ctx);
    let report = validate_raw(&seed, &request.constraints, &ctx);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: {} violations, confidence {:.2}",
            if report.valid { "VALID" } else { "INVALID" },
            report.violations.len(),
            report.confidence
        );
        for violation in &report.violations {
            let date = violation
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let staff = violation.staff_id.as_deref().unwrap_or("-");
            println!(
                "  [{:?}] {} staff={} date={} magnitude={:.1}",
                violation.severity, violation.constraint, staff, date, violation.magnitude
            );
        }
        for recommendation in &report.recommendations {
            println!("  - {}", recommendation);
        }
    }

    Ok(report.valid)
}
