//! Curation tools for the record store.
//!
//! Every subcommand prints JSON (or the plain-text review queue) on stdout.
//! Mutating subcommands write only when something changed and `--dry-run`
//! is not set.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use lakeside_common::{
    derive_view, Config, FilterInput, Kind, Overnight, Record, RecordStore, ViewState,
};
use lakeside_curator::apply::{apply_discoveries, DiscoveryFile};
use lakeside_curator::dedup::{dedup_store, DEFAULT_MAX_DISTANCE_M};
use lakeside_curator::infra::{init_tracing, load_curation_context, DataArgs};
use lakeside_curator::manual::{apply_manual_promotion, ManualPromotion};
use lakeside_curator::osm::{cleanup_osm_gastros, import_osm, OsmCandidateFile};
use lakeside_curator::review_queue::{render_queue, review_queue, ReviewLinks, DEFAULT_QUEUE_LIMIT};
use lakeside_curator::sanitize::sanitize_store;
use lakeside_curator::{CandidateVerifier, Verification};
use page_probe::PageProbeClient;

#[derive(Parser)]
#[command(name = "curate")]
#[command(about = "Curation tools for the sailing catalog")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked list of unverified records for manual review
    Queue {
        #[arg(long, default_value_t = DEFAULT_QUEUE_LIMIT)]
        limit: usize,

        /// Write the queue to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Normalize candidate and authoritative URLs
    Sanitize {
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove duplicate OSM imports
    Dedup {
        /// Maximum distance in meters between duplicates
        #[arg(long, default_value_t = DEFAULT_MAX_DISTANCE_M)]
        max_m: f64,

        #[arg(long)]
        dry_run: bool,
    },

    /// Attach discovered websites as candidate URLs
    Apply {
        /// Discovery file: {"candidates": [{name, website, foundAt, foundVia}]}
        #[arg(long)]
        candidates: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Mark one record verified from a reviewer's reply ("ok" or "source <url>")
    Promote {
        /// Record type; read from the template's Type line if omitted
        #[arg(long = "type")]
        kind: Option<String>,

        /// Record id; read from the template's ID line if omitted
        #[arg(long)]
        id: Option<String>,

        /// Issue body as produced by the review queue
        #[arg(long, conflicts_with = "template_file")]
        template: Option<String>,

        #[arg(long)]
        template_file: Option<PathBuf>,

        #[arg(long)]
        reply: String,

        #[arg(long)]
        dry_run: bool,
    },

    /// Create candidate records from an OSM export
    ImportOsm {
        /// {"candidates": [{kind, name, lat, lng, osmType, osmId, website, foundAt, tags}]}
        #[arg(long)]
        candidates: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Remove unverified gastros imported from OSM
    CleanupGastros {
        #[arg(long)]
        dry_run: bool,
    },

    /// Check a single URL
    Check { url: String },

    /// Verified share and backlog per kind
    Coverage,

    /// Filter one kind's records
    Search {
        /// harbor, anchor, rental, gastro or service
        #[arg(long)]
        kind: String,

        #[arg(long, default_value = "")]
        q: String,

        #[arg(long, default_value = "ALL")]
        country: String,

        /// ANY, YES or NO
        #[arg(long, default_value = "ANY")]
        overnight: String,

        #[arg(long, default_value = "")]
        min_depth: String,

        #[arg(long, default_value = "")]
        min_draft: String,

        #[arg(long, default_value = "")]
        min_guest_berths: String,

        /// Only verified records
        #[arg(long)]
        verified_only: bool,
    },

    /// JSON schema of a record
    Schema,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckOutput {
    url: String,
    ok: bool,
    #[serde(flatten)]
    verification: Verification,
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

    match cli.command {
        Commands::Schema => {
            let schema = schemars::schema_for!(Record);
            print_json(&schema)
        }
        Commands::Check { url } => {
            let config = Config::from_env().context("Invalid configuration")?;
            let client = PageProbeClient::new(&config.user_agent, config.fetch_timeout)
                .context("Failed to build HTTP client")?;
            let verification = client.verify(&url).await;
            print_json(&CheckOutput {
                url,
                ok: verification.is_reachable(),
                verification,
            })
        }
        Commands::Queue { limit, out } => {
            let (config, store) = load_curation_context(&cli.data)?;
            let links = ReviewLinks {
                site_url: &config.site_url,
                issues_url: &config.issues_url,
                lake: cli.data.lake.as_deref(),
            };
            let entries = review_queue(&store, &links, limit);
            let text = render_queue(&entries, cli.data.lake.as_deref(), limit);
            match out {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    print_json(&json!({ "out": path, "count": entries.len() }))
                }
                None => {
                    print!("{text}");
                    Ok(())
                }
            }
        }
        Commands::Sanitize { dry_run } => {
            let (_, mut store) = load_curation_context(&cli.data)?;
            let report = sanitize_store(&mut store);
            persist(&store, report.touched > 0, dry_run)?;
            print_json(&report)
        }
        Commands::Dedup { max_m, dry_run } => {
            let (_, mut store) = load_curation_context(&cli.data)?;
            let report = dedup_store(&mut store, max_m);
            persist(&store, report.removed > 0, dry_run)?;
            print_json(&report)
        }
        Commands::Apply {
            candidates,
            dry_run,
        } => {
            let discoveries = DiscoveryFile::load(&candidates)?;
            let (_, mut store) = load_curation_context(&cli.data)?;
            let changed = apply_discoveries(&mut store, &discoveries);
            persist(&store, changed > 0, dry_run)?;
            print_json(&json!({ "changed": changed }))
        }
        Commands::Promote {
            kind,
            id,
            template,
            template_file,
            reply,
            dry_run,
        } => {
            let template = match template_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read template {}", path.display()))?,
                ),
                None => template,
            };
            let request = ManualPromotion::resolve(
                kind.as_deref(),
                id.as_deref(),
                template.as_deref(),
                &reply,
            )?;
            let (_, mut store) = load_curation_context(&cli.data)?;
            let outcome = apply_manual_promotion(&mut store, &request, Utc::now().date_naive())?;
            persist(&store, true, dry_run)?;
            print_json(&json!({ "ok": true, "updated": outcome }))
        }
        Commands::ImportOsm {
            candidates,
            dry_run,
        } => {
            let file = OsmCandidateFile::load(&candidates)?;
            let (_, mut store) = load_curation_context(&cli.data)?;
            let report = import_osm(&mut store, &file, Utc::now().date_naive());
            persist(&store, report.touched > 0, dry_run)?;
            print_json(&report)
        }
        Commands::CleanupGastros { dry_run } => {
            let (_, mut store) = load_curation_context(&cli.data)?;
            let report = cleanup_osm_gastros(&mut store);
            persist(&store, report.removed > 0, dry_run)?;
            print_json(&report)
        }
        Commands::Coverage => {
            let (_, store) = load_curation_context(&cli.data)?;
            let view = derive_view(&store, &ViewState::default());
            let kinds: Vec<_> = view
                .kinds
                .iter()
                .map(|k| {
                    json!({
                        "kind": k.kind,
                        "total": k.coverage.total,
                        "verified": k.coverage.verified,
                        "pct": k.coverage.pct,
                        "backlog": {
                            "withCandidate": k.backlog.with_candidate.len(),
                            "withoutCandidate": k.backlog.without_candidate.len(),
                        },
                    })
                })
                .collect();
            print_json(&json!({ "kinds": kinds, "overall": view.overall_coverage() }))
        }
        Commands::Search {
            kind,
            q,
            country,
            overnight,
            min_depth,
            min_draft,
            min_guest_berths,
            verified_only,
        } => {
            let kind = Kind::parse(&kind).ok_or_else(|| anyhow!("Unknown kind '{kind}'"))?;
            let (_, store) = load_curation_context(&cli.data)?;
            let state = ViewState {
                filters: FilterInput {
                    q,
                    country,
                    overnight: Overnight::parse(&overnight),
                    min_depth,
                    min_draft,
                    min_guest_berths,
                },
                show_unverified: !verified_only,
                ..ViewState::default()
            };
            let view = derive_view(&store, &state);
            let records = view.kind(kind).map(|k| k.records.clone()).unwrap_or_default();
            print_json(&records)
        }
    }
}

fn persist(store: &RecordStore, changed: bool, dry_run: bool) -> Result<()> {
    if !changed {
        info!("Nothing changed, no files written");
    } else if dry_run {
        info!("Dry run, nothing written");
    } else {
        store.save().context("Failed to write records")?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
