//! Dashboard configuration.
//!
//! Read from a JSON file. Every field has a default, so a file only needs to
//! name what it overrides, and a missing `--config` means
//! [`AppConfig::default`].

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use skyview_figure::{PlotKind, Theme, ThemePair};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Theme applied while dark mode is off.
    pub light_theme: Theme,
    /// Theme applied while dark mode is on.
    pub dark_theme: Theme,
    pub default_plot: PlotKind,
    pub default_x: String,
    pub default_y: String,
    pub default_bins: usize,
    pub default_colormap: String,
    pub dark_mode: bool,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            light_theme: Theme::light_minimal(),
            dark_theme: Theme::dark_minimal(),
            default_plot: PlotKind::Heatmap,
            default_x: "ra".to_string(),
            default_y: "dec".to_string(),
            default_bins: 200,
            default_colormap: "viridis".to_string(),
            dark_mode: false,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_bins == 0 {
            bail!("default_bins must be at least 1");
        }
        if self.default_x.is_empty() || self.default_y.is_empty() {
            bail!("default_x and default_y must name columns");
        }
        Ok(())
    }

    pub fn themes(&self) -> ThemePair {
        ThemePair::new(self.light_theme.clone(), self.dark_theme.clone())
    }
}
