//! Configuration for stickerpack.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (STICKERPACK_HOMESERVER, STICKERPACK_ACCESS_TOKEN,
//!    STICKERPACK_TELEGRAM_TOKEN)
//! 2. Config file given with `--config`
//! 3. `./config.json` (the classic credentials file)
//! 4. `<config dir>/stickerpack/config.yaml`
//!
//! The file is parsed as YAML, so a JSON credentials file of the form
//! `{"homeserver": ..., "access_token": ...}` works unchanged.
//!
//! The resolved configuration is passed explicitly to whatever needs it;
//! there is no process-wide config state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw config file schema
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Homeserver base URL
    pub homeserver: Option<String>,
    /// Access token used for uploads
    pub access_token: Option<String>,
    /// Bot token for importing Telegram sticker sets
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    pub ffmpeg: Option<String>,
    pub ffprobe: Option<String>,
    pub lottie_convert: Option<String>,
    pub gifsicle: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub tool_timeout_seconds: Option<u64>,
    pub upload_timeout_seconds: Option<u64>,
    pub max_concurrent_tools: Option<usize>,
}

/// Homeserver endpoint and credentials
#[derive(Debug, Clone)]
pub struct MatrixSettings {
    pub homeserver_url: String,
    pub access_token: String,
}

/// External tool binaries
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub lottie_convert: PathBuf,
    pub gifsicle: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            lottie_convert: PathBuf::from("lottie_convert.py"),
            gifsicle: PathBuf::from("gifsicle"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Limits {
    pub tool_timeout_seconds: u64,
    pub upload_timeout_seconds: u64,
    pub max_concurrent_tools: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            tool_timeout_seconds: 120,
            upload_timeout_seconds: 60,
            max_concurrent_tools: 2,
        }
    }
}

impl Limits {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_seconds)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_seconds)
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    /// Homeserver credentials (absent when neither file nor env provide them)
    pub matrix: Option<MatrixSettings>,
    pub telegram_bot_token: Option<String>,
    pub tools: ToolPaths,
    pub limits: Limits,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Credentials, or an error explaining how to provide them
    pub fn matrix(&self) -> Result<&MatrixSettings> {
        self.matrix.as_ref().context(
            "No homeserver credentials configured. Create config.json with \
             \"homeserver\" and \"access_token\", or set STICKERPACK_HOMESERVER \
             and STICKERPACK_ACCESS_TOKEN",
        )
    }

    /// Telegram bot token, or an error explaining how to provide it
    pub fn telegram_token(&self) -> Result<&str> {
        self.telegram_bot_token.as_deref().context(
            "No Telegram bot token configured. Add \"telegram_bot_token\" to the \
             config file or set STICKERPACK_TELEGRAM_TOKEN",
        )
    }

    /// Homeserver URL, if known
    pub fn homeserver_url(&self) -> Option<&str> {
        self.matrix.as_ref().map(|m| m.homeserver_url.as_str())
    }
}

/// Pick the config file to read
fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from("config.json");
    if local.exists() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("stickerpack").join("config.yaml");
    user.exists().then_some(user)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(content: &str) -> Result<ConfigFile> {
    Ok(serde_yaml::from_str(content)?)
}

/// Merge file values with environment overrides
fn resolve(
    file: ConfigFile,
    config_file: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let homeserver = env("STICKERPACK_HOMESERVER").or(file.homeserver);
    let access_token = env("STICKERPACK_ACCESS_TOKEN").or(file.access_token);
    let telegram_bot_token = env("STICKERPACK_TELEGRAM_TOKEN").or(file.telegram_bot_token);

    let matrix = match (homeserver, access_token) {
        (Some(homeserver_url), Some(access_token)) => Some(MatrixSettings {
            homeserver_url: homeserver_url.trim_end_matches('/').to_string(),
            access_token,
        }),
        _ => None,
    };

    let defaults = ToolPaths::default();
    let tools = ToolPaths {
        ffmpeg: file.tools.ffmpeg.map(PathBuf::from).unwrap_or(defaults.ffmpeg),
        ffprobe: file.tools.ffprobe.map(PathBuf::from).unwrap_or(defaults.ffprobe),
        lottie_convert: file
            .tools
            .lottie_convert
            .map(PathBuf::from)
            .unwrap_or(defaults.lottie_convert),
        gifsicle: file.tools.gifsicle.map(PathBuf::from).unwrap_or(defaults.gifsicle),
    };

    let base = Limits::default();
    let limits = match file.limits {
        Some(l) => Limits {
            tool_timeout_seconds: l.tool_timeout_seconds.unwrap_or(base.tool_timeout_seconds),
            upload_timeout_seconds: l
                .upload_timeout_seconds
                .unwrap_or(base.upload_timeout_seconds),
            max_concurrent_tools: l
                .max_concurrent_tools
                .unwrap_or(base.max_concurrent_tools)
                .max(1),
        },
        None => base,
    };

    ResolvedConfig {
        matrix,
        telegram_bot_token,
        tools,
        limits,
        config_file,
    }
}

/// Load configuration from all sources
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config_file = find_config_file(explicit);

    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve(file, config_file, |key| std::env::var(key).ok()))
}
