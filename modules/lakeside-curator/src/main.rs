//! Check a batch of candidate URLs and promote the ones that hold up.
//!
//! Prints `{checked, promoted, skipped, errors}` as JSON on stdout.

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use lakeside_curator::infra::{init_tracing, load_context, DataArgs};
use lakeside_curator::{promote_candidates, PromotionOptions, DEFAULT_BATCH_LIMIT};
use page_probe::PageProbeClient;

#[derive(Parser)]
#[command(name = "verify-candidates")]
#[command(about = "Verify candidate URLs and promote valid ones to authoritative sources")]
#[command(version)]
struct Cli {
    /// Maximum number of candidates checked in this run
    #[arg(long, default_value_t = DEFAULT_BATCH_LIMIT)]
    limit: usize,

    /// Check and report without writing any file
    #[arg(long, alias = "dryRun")]
    dry_run: bool,

    /// Accepted for compatibility; the HTTP probe has no visible browser
    #[arg(long)]
    headed: bool,

    #[command(flatten)]
    data: DataArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    if cli.headed {
        info!("--headed has no effect with the HTTP probe");
    }

    let (config, mut store) = load_context(&cli.data)?;
    let denylist = config.denylist().context("Failed to load denylist")?;
    let verifier = PageProbeClient::new(&config.user_agent, config.fetch_timeout)
        .context("Failed to build HTTP client")?;

    let options = PromotionOptions {
        limit: cli.limit,
        dry_run: cli.dry_run,
        ..PromotionOptions::new(Utc::now().date_naive())
    };

    let report = promote_candidates(&mut store, &denylist, &verifier, &options).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
