//! Command-line interface for stickerpack.
//!
//! Provides commands for building a pack from a directory, importing
//! Telegram sticker packs or a Scalar asset dump, and showing the resolved
//! configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::{ExternalTranscoder, MatrixUploader, TelegramCatalog, Transcoder};
use crate::config::{load_config, ResolvedConfig};
use crate::core::{add_to_index, BuildReport, PackBuilder};
use crate::ingest::{import_pack, import_scalar, parse_pack_reference, DirectorySource, ProviderError};
use crate::media::Normalizer;

/// stickerpack - Incremental sticker pack builder
#[derive(Parser, Debug)]
#[command(name = "stickerpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file with homeserver credentials (JSON or YAML)
    #[arg(long, global = true, env = "STICKERPACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert and upload a directory of stickers, writing <dir>/pack.json
    Build {
        /// Directory containing sticker images, videos or .tgs files
        path: PathBuf,

        /// Pack display name for a new pack (defaults to the directory name)
        #[arg(long)]
        title: Option<String>,

        /// Pack ID for a new pack (defaults to the sanitized directory name)
        #[arg(long)]
        id: Option<String>,

        /// Picker directory to publish the manifest into and add to index.json
        #[arg(long)]
        add_to_index: Option<PathBuf>,
    },

    /// Reupload Telegram sticker packs into a picker directory
    Import {
        /// Pack links (t.me/addstickers/<name>) or short names
        #[arg(required = true)]
        packs: Vec<String>,

        /// Picker directory receiving the manifests and index.json
        #[arg(short, long, default_value = "web/packs")]
        output_dir: PathBuf,
    },

    /// Convert a Scalar sticker asset dump into manifests
    ImportScalar {
        /// Asset dump JSON file
        file: PathBuf,

        /// Picker directory receiving the manifests and index.json
        #[arg(short, long, default_value = "web/packs")]
        output_dir: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;

        match self.command {
            Commands::Build {
                path,
                title,
                id,
                add_to_index,
            } => build_pack(&config, &path, title, id, add_to_index.as_deref()).await,
            Commands::Import { packs, output_dir } => {
                run_provider_import(&config, &packs, &output_dir).await
            }
            Commands::ImportScalar { file, output_dir } => {
                run_scalar_import(&config, &file, &output_dir).await
            }
            Commands::Config => show_config(&config),
        }
    }
}

/// Build (or incrementally rebuild) the pack in `dir`
async fn build_pack(
    config: &ResolvedConfig,
    dir: &Path,
    title: Option<String>,
    id: Option<String>,
    index_dir: Option<&Path>,
) -> Result<()> {
    let uploader = MatrixUploader::new(config.matrix()?, config.limits.upload_timeout())
        .context("Failed to create upload client")?;
    let transcoder: Arc<dyn Transcoder> = Arc::new(ExternalTranscoder::from_config(config));
    let normalizer = Normalizer::from_config(transcoder, config);

    let source = DirectorySource::new(dir)?;
    let mut defaults = source.defaults();
    if let Some(title) = title {
        defaults.title = title;
    }
    if let Some(id) = id {
        defaults.id = id;
    }

    let builder = PackBuilder::new(&normalizer, &uploader);
    let mut session = builder.begin(source.manifest_path(), defaults).await?;

    for path in source.entries().await? {
        let Some(item) = source.load(&path).await else {
            continue;
        };

        if let Err(e) = session.push(item).await {
            if let Some(saved) = e.diagnostic_path() {
                eprintln!("Failing input saved to {}", saved.display());
            }
            return Err(e).context("Pack build aborted, previous pack.json left unchanged");
        }
    }

    let report = session.commit().await?;
    println!(
        "Wrote {} stickers to {} ({} uploaded, {} reused)",
        report.manifest.len(),
        report.manifest_path.display(),
        report.uploaded,
        report.reused
    );

    if let Some(index_dir) = index_dir {
        publish(&report, index_dir, config.homeserver_url()).await?;
    }

    Ok(())
}

/// Copy the manifest into a picker directory and list it in the index
async fn publish(report: &BuildReport, index_dir: &Path, homeserver_url: Option<&str>) -> Result<()> {
    tokio::fs::create_dir_all(index_dir)
        .await
        .with_context(|| format!("Failed to create {}", index_dir.display()))?;

    let name = report.manifest.published_name();
    let target = index_dir.join(&name);
    tokio::fs::copy(&report.manifest_path, &target)
        .await
        .with_context(|| format!("Failed to copy manifest to {}", target.display()))?;
    info!(target = %target.display(), "Published manifest");

    if add_to_index(index_dir, &name, homeserver_url)? {
        println!("Added {} to {}", name, index_dir.join("index.json").display());
    }
    Ok(())
}

/// Reupload provider packs; every reference is checked before any network call
async fn run_provider_import(config: &ResolvedConfig, packs: &[String], output_dir: &Path) -> Result<()> {
    if let Some(bad) = packs.iter().find(|p| parse_pack_reference(p).is_none()) {
        anyhow::bail!("'{}' doesn't look like a sticker pack URL", bad);
    }

    let catalog = TelegramCatalog::new(config.telegram_token()?, config.limits.upload_timeout())
        .context("Failed to create Telegram client")?;
    let uploader = MatrixUploader::new(config.matrix()?, config.limits.upload_timeout())
        .context("Failed to create upload client")?;
    let transcoder: Arc<dyn Transcoder> = Arc::new(ExternalTranscoder::from_config(config));
    let normalizer = Normalizer::from_config(transcoder, config);
    let builder = PackBuilder::new(&normalizer, &uploader);

    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for reference in packs {
        let result = match import_pack(&catalog, &builder, reference, output_dir, config.homeserver_url()).await {
            Ok(result) => result,
            Err(e) => {
                if let ProviderError::Build(build) = &e {
                    if let Some(saved) = build.diagnostic_path() {
                        eprintln!("Failing input saved to {}", saved.display());
                    }
                }
                return Err(e).with_context(|| format!("Failed to import {}", reference));
            }
        };

        println!(
            "Saved {} as {}.json ({} downloaded, {} reused)",
            result.title, result.short_name, result.downloaded, result.report.reused
        );
        if result.index_updated {
            println!("Added {}.json to {}", result.short_name, output_dir.join("index.json").display());
        }
    }
    Ok(())
}

async fn run_scalar_import(config: &ResolvedConfig, file: &Path, output_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let result = import_scalar(file, output_dir, config.homeserver_url())
        .await
        .with_context(|| format!("Failed to import {}", file.display()))?;

    for title in &result.skipped {
        println!("Skipping {}", title);
    }
    for path in &result.written {
        println!("Wrote {}", path.display());
    }
    if result.index_updated {
        println!("Updated {}", output_dir.join("index.json").display());
    }
    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("stickerpack configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Homeserver:");
    match &cfg.matrix {
        Some(matrix) => {
            println!("  URL:          {}", matrix.homeserver_url);
            println!("  Access token: {}", mask_token(&matrix.access_token));
        }
        None => println!("  (not configured)"),
    }
    println!(
        "Telegram bot:   {}",
        cfg.telegram_bot_token
            .as_deref()
            .map(mask_token)
            .unwrap_or_else(|| "(not configured)".to_string())
    );
    println!();
    println!("Tools:");
    println!("  ffmpeg:         {}", cfg.tools.ffmpeg.display());
    println!("  ffprobe:        {}", cfg.tools.ffprobe.display());
    println!("  lottie_convert: {}", cfg.tools.lottie_convert.display());
    println!("  gifsicle:       {}", cfg.tools.gifsicle.display());
    println!();
    println!("Limits:");
    println!("  Tool timeout:     {}s", cfg.limits.tool_timeout_seconds);
    println!("  Upload timeout:   {}s", cfg.limits.upload_timeout_seconds);
    println!("  Concurrent tools: {}", cfg.limits.max_concurrent_tools);

    Ok(())
}

/// Show only the last four characters of a secret
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
