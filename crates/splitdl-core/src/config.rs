use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration loaded from `~/.config/splitdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitdlConfig {
    /// Number of segments the resource is split into at start. The rebalancer
    /// may run more workers than this while it refills gaps or splits stragglers.
    pub max_workers: usize,
    /// Segment failures tolerated before the job stops refilling gaps.
    /// `None` retries forever.
    #[serde(default)]
    pub max_segment_failures: Option<u32>,
    /// Connect timeout for each HTTP request, in seconds.
    pub connect_timeout_secs: u64,
    /// Follow HTTP redirects (up to 10 hops).
    pub follow_redirects: bool,
    /// Optional transport receive buffer size in bytes (None = libcurl default).
    #[serde(default)]
    pub buffer_size: Option<usize>,
    /// Directory for per-segment temp files (None = system temp dir).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for SplitdlConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            max_segment_failures: Some(10),
            connect_timeout_secs: 30,
            follow_redirects: true,
            buffer_size: None,
            temp_dir: None,
        }
    }
}

impl SplitdlConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Directory used for segment temp files.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("splitdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SplitdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SplitdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("failed to write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: SplitdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
