use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// ConfigFile: deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub base: Option<String>,
    pub ext: Option<String>,
    #[serde(default)]
    pub discovery: DiscoveryConfigFile,
    #[serde(default)]
    pub layout: LayoutConfigFile,
    #[serde(default)]
    pub viewer: ViewerConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfigFile {
    pub batch_size: Option<u32>,
    pub max_consecutive_failures: Option<u32>,
    pub batch_delay_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LayoutConfigFile {
    pub eager_count: Option<usize>,
    pub lookahead_px: Option<u32>,
    pub item_height_px: Option<u32>,
    pub gap_px: Option<u32>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub resize_debounce_ms: Option<u64>,
    pub frame_budget_ms: Option<u64>,
    pub scroll_step: Option<u32>,
}

// ---------------------------------------------------------------------------
// Config: resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub base: String,
    pub ext: String,
    pub discovery: DiscoveryConfig,
    pub layout: LayoutConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub batch_size: u32,
    pub max_consecutive_failures: u32,
    pub batch_delay: Duration,
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Items at positions below this are promoted on insertion.
    pub eager_count: usize,
    /// Proximity margin around the viewport for lazy promotion.
    pub lookahead_px: u32,
    pub item_height_px: u32,
    pub gap_px: u32,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub resize_debounce: Duration,
    pub frame_budget: Duration,
    pub scroll_step: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfigFile::default().resolve()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfigFile::default().resolve()
    }
}

impl DiscoveryConfigFile {
    fn resolve(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            batch_size: self.batch_size.unwrap_or(10).max(1),
            max_consecutive_failures: self.max_consecutive_failures.unwrap_or(5).max(1),
            batch_delay: Duration::from_millis(self.batch_delay_ms.unwrap_or(10)),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms.unwrap_or(5000)),
        }
    }
}

impl LayoutConfigFile {
    fn resolve(&self) -> LayoutConfig {
        LayoutConfig {
            eager_count: self.eager_count.unwrap_or(6),
            lookahead_px: self.lookahead_px.unwrap_or(50),
            item_height_px: self.item_height_px.unwrap_or(300).max(1),
            gap_px: self.gap_px.unwrap_or(16),
        }
    }
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, cli: CliOverrides) {
        if let Some(v) = cli.base {
            debug!("config: CLI override base={v}");
            self.base = Some(v);
        }
        if let Some(v) = cli.ext {
            debug!("config: CLI override ext={v}");
            self.ext = Some(v);
        }
        if let Some(v) = cli.batch_size {
            debug!("config: CLI override batch_size={v}");
            self.discovery.batch_size = Some(v);
        }
        if let Some(v) = cli.max_failures {
            debug!("config: CLI override max_consecutive_failures={v}");
            self.discovery.max_consecutive_failures = Some(v);
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    pub fn resolve(self) -> Config {
        let config = Config {
            base: self.base.unwrap_or_else(|| "./photos_webp".into()),
            ext: self
                .ext
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or_else(|| "webp".into()),
            discovery: self.discovery.resolve(),
            layout: self.layout.resolve(),
            viewer: ViewerConfig {
                resize_debounce: Duration::from_millis(
                    self.viewer.resize_debounce_ms.unwrap_or(250),
                ),
                frame_budget: Duration::from_millis(self.viewer.frame_budget_ms.unwrap_or(32)),
                scroll_step: self.viewer.scroll_step.unwrap_or(3),
            },
        };
        info!(
            "config: resolved base={}, ext={}, batch_size={}, max_consecutive_failures={}, \
             batch_delay={}ms, probe_timeout={}ms, eager_count={}, lookahead={}px, \
             item_height={}px, gap={}px, resize_debounce={}ms, frame_budget={}ms",
            config.base,
            config.ext,
            config.discovery.batch_size,
            config.discovery.max_consecutive_failures,
            config.discovery.batch_delay.as_millis(),
            config.discovery.probe_timeout.as_millis(),
            config.layout.eager_count,
            config.layout.lookahead_px,
            config.layout.item_height_px,
            config.layout.gap_px,
            config.viewer.resize_debounce.as_millis(),
            config.viewer.frame_budget.as_millis(),
        );
        config
    }
}

/// Values given on the command line; they win over the config file.
#[derive(Default, Clone)]
pub struct CliOverrides {
    pub base: Option<String>,
    pub ext: Option<String>,
    pub batch_size: Option<u32>,
    pub max_failures: Option<u32>,
}

/// Resolve the XDG config path for photowall.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("photowall").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}
