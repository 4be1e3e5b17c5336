//! Uplift CLI: upload local files through the configured storage service.
//!
//! Configuration comes from the environment (see `UploadConfig::from_env`):
//! set UPLOAD_STORAGE_SERVICE plus either UPLOAD_PROXY_BASE_URL or
//! S3_BUCKET with AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uplift_cli::{failed_count, init_tracing, load_files};
use uplift_core::UploadConfig;
use uplift_storage::{StaticToken, UploadStore};

#[derive(Parser)]
#[command(name = "uplift", about = "Upload orchestration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more files and wait for every transfer to finish
    Upload {
        /// Paths of the files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Uploader (logical destination) name
        #[arg(long, default_value = "cli")]
        uploader: String,
    },
    /// Print the resolved storage configuration
    Config,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Loads .env first so RUST_LOG from it reaches the subscriber
    let config = UploadConfig::from_env().context("Failed to load upload configuration")?;
    init_tracing();

    match cli.command {
        Commands::Config => {
            print_json(&serde_json::json!({
                "storage": config.storage,
                "ownerId": config.owner_id,
                "credentialsConfigured": config.credentials.is_some(),
                "proxyTokenConfigured": config.proxy_token.is_some(),
                "httpTimeoutSecs": config.dispatch.http_timeout.as_secs(),
            }))?;
        }
        Commands::Upload { files, uploader } => {
            let mut builder = UploadStore::builder(config.owner_id.clone())
                .credentials(config.credentials.clone())
                .settings(config.dispatch.clone());
            if let Some(token) = config.proxy_token.clone() {
                builder = builder.token_source(Arc::new(StaticToken::new(token)));
            }
            let store = builder.build().context("Failed to create upload store")?;

            store
                .get_or_create(&uploader, &config.storage)
                .await
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Storage prerequisites not met for the {} service",
                        config.storage.service()
                    )
                })?;

            let local_files = load_files(&files).await?;
            let total = local_files.len();
            store.upload_files(&uploader, local_files).await?;
            store.idle().await;

            let records = store.files(&uploader).await.unwrap_or_default();
            print_json(&records)?;

            let failed = failed_count(&records);
            if failed > 0 {
                return Err(anyhow::anyhow!("{} of {} uploads failed", failed, total));
            }
            tracing::info!(uploader = %uploader, total, "All uploads succeeded");
        }
    }

    Ok(())
}
