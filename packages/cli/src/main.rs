#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for building voter statistics reports.
//!
//! Connects to the constituent store from `DATABASE_URL`, builds the
//! report for one tenant and prints it as JSON on stdout. Rendering to
//! spreadsheets or PDFs is left to whatever consumes that JSON.

use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use voter_stats_database::PostgresPopulationStore;
use voter_stats_report::normalize::normalize;
use voter_stats_report::{ReportOptions, build_report};

#[derive(Parser)]
#[command(name = "voter_stats", about = "Voter statistics report builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the statistics report for a tenant and print it as JSON
    Report {
        /// Tenant (office) identifier
        tenant_id: String,
        /// Number of most-served constituents to rank (overrides
        /// `VOTER_STATS_TOP_LIMIT`)
        #[arg(long)]
        top_limit: Option<u32>,
        /// Count constituents without a value under this label instead of
        /// leaving them out (overrides `VOTER_STATS_UNKNOWN_LABEL`)
        #[arg(long)]
        unknown_label: Option<String>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the canonical grouping key of each given value
    Normalize {
        /// Values to normalize (e.g. "Zona III" "São Paulo")
        values: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            tenant_id,
            top_limit,
            unknown_label,
            pretty,
        } => {
            let mut options = ReportOptions::from_env();
            if let Some(limit) = top_limit {
                options.top_limit = limit;
            }
            if unknown_label.is_some() {
                options.unknown_label = unknown_label;
            }

            match run_report(&tenant_id, &options, pretty).await {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Report unavailable: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Normalize { values } => {
            for value in &values {
                println!("{value}\t{}", normalize(value));
            }
            ExitCode::SUCCESS
        }
    }
}

async fn run_report(
    tenant_id: &str,
    options: &ReportOptions,
    pretty: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let store = PostgresPopulationStore::connect_from_env().await?;
    let report = build_report(&store, tenant_id, options).await?;

    log::info!("Report for tenant {tenant_id} ready in {:.2?}", start.elapsed());

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    Ok(json)
}
