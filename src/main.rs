// src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use credit_health::pipeline;
use credit_health::report::{EvaluationMode, EvaluationResult};
use credit_health::storage::ClientLog;
use credit_health::utils::{self, AppError};

/// Command Line Interface for the credit report health checker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV client log that processed reports are appended to
    #[arg(long, env = "CREDIT_HEALTH_LOG", default_value = "clients.csv", global = true)]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a credit report (text or PDF) and record the outcome
    Evaluate {
        /// Path to the report
        report: PathBuf,

        /// How the rule table is applied
        #[arg(long, value_enum, default_value_t = EvaluationMode::Auto)]
        mode: EvaluationMode,

        /// Processing date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Do not append the result to the client log
        #[arg(long)]
        no_save: bool,
    },
    /// List stored client records
    Clients,
}

fn parse_as_of(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw {
        None => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| AppError::Config(format!("Invalid --as-of date '{}': {}", s, e))),
    }
}

fn print_summary(result: &EvaluationResult) {
    println!("Extracted data for {} ({})", result.subject, result.processed_on);

    for (bureau, report) in &result.bureaus {
        let f = &report.fields;
        println!(
            "  {:<10} score={} late={} derogatory={} inquiries={} open={} utilization={:.1}%",
            bureau.to_string(),
            f.credit_score.map_or_else(|| "unknown".to_string(), |s| s.to_string()),
            f.late_payments.total(),
            f.derogatory,
            f.inquiries,
            f.open_accounts,
            f.utilization,
        );
        let qualifies: Vec<String> = report
            .qualification
            .iter()
            .map(|(check, ok)| format!("{}={}", check, if ok { "pass" } else { "fail" }))
            .collect();
        println!("  {:<10} qualification: {}", "", qualifies.join(", "));
    }
    println!("  Credit age: {:.1} years", result.document.credit_age_years);

    println!("Status: {}", result.status);
    for issue in &result.issues {
        println!("  - {}", issue);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    match args.command {
        Command::Evaluate { report, mode, as_of, json, no_save } => {
            let as_of = parse_as_of(as_of.as_deref())?;
            let log = if no_save { None } else { Some(ClientLog::new(&args.log_file)?) };

            let result = pipeline::process_file(&report, as_of, mode, log.as_ref())?;

            if json {
                let rendered = serde_json::to_string_pretty(&result)
                    .map_err(|e| AppError::Config(format!("Failed to render result: {}", e)))?;
                println!("{}", rendered);
            } else {
                print_summary(&result);
            }
        }
        Command::Clients => {
            let log = ClientLog::new(&args.log_file)?;
            let records = log.load()?;
            tracing::info!("Loaded {} record(s) from {}", records.len(), log.path().display());
            for record in records {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.name,
                    record.upload_date,
                    record.status,
                    record.issue_list().join(", ")
                );
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::debug!("Starting with args: {:?}", args);

    // 3. Run, reporting any failure as one readable line
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Invocation failed [{}]: {}", e.reason().code(), e);
            eprintln!("Something went wrong ({}): {}", e.reason().code(), e);
            ExitCode::FAILURE
        }
    }
}
