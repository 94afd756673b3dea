// src/main.rs
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::time::Instant;

use geo_resolver_lib::{
    models::SchemeTag,
    pipeline,
    resolve,
    store::{GeoStore, PgGeoStore},
    utils::{
        config::AppConfig,
        db_connect::{self, PgPool},
        env::load_env,
        progress_config::ProgressConfig,
    },
    ResolveError,
};

#[derive(Parser, Debug)]
#[command(name = "geo_resolver", about = "Czech administrative unit identifier resolver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the hierarchy and run every fusion pass (idempotent).
    Build,
    /// Resolve a code or name to ranked hierarchy nodes.
    Resolve {
        query: String,
        /// Restrict to one scheme: ico, zuj, lau2, lau1, nuts3, ruian, cadastral.
        #[arg(long = "type", value_parser = parse_filter)]
        scheme: Option<SchemeTag>,
    },
    /// Create tables, extensions and indexes, then exit.
    Schema,
}

fn parse_filter(raw: &str) -> Result<SchemeTag, String> {
    SchemeTag::from_filter(raw).ok_or_else(|| format!("unknown identifier type '{}'", raw))
}

async fn open_store(config: &AppConfig) -> Result<PgGeoStore> {
    let pool: PgPool = db_connect::connect_with_retry(config)
        .await
        .context("Failed to connect to database")?;
    let (total, idle, in_use) = db_connect::get_pool_status(&pool);
    info!(
        "Pool ready: {} connections ({} idle, {} in use)",
        total, idle, in_use
    );
    Ok(PgGeoStore::new(pool))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    load_env();
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Command::Schema => {
            let store = open_store(&config).await?;
            store.ensure_schema().await?;
            info!("Schema is up to date");
        }
        Command::Build => {
            let start = Instant::now();
            config.log_config();
            let store = open_store(&config).await?;
            let stats = pipeline::run_pipeline(&store, &config, &ProgressConfig::from_env()).await?;
            info!(
                "Build finished in {:.2?}: {} identifiers matched, {} unmatched, {} passes failed",
                start.elapsed(),
                stats.total_matched(),
                stats.total_unmatched(),
                stats.failed_passes.len()
            );
            if let (None, Some(reason)) = (&stats.build, &stats.build_failure) {
                return Err(anyhow!("Hierarchy build failed: {}", reason));
            }
        }
        Command::Resolve { query, scheme } => {
            let store = open_store(&config).await?;
            match resolve(&store, &query, scheme).await {
                Ok(resolution) => {
                    println!("{}", serde_json::to_string_pretty(&resolution)?);
                }
                Err(ResolveError::NotFound { reason, .. }) => {
                    println!(
                        "{}",
                        serde_json::json!({ "detail": reason.to_string() })
                    );
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}
