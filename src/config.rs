//! Configuration management for Amnesia Comics

use std::env;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub cache: CacheConfig,
    pub analysis: AnalysisConfig,
    pub focus: FocusConfig,
}

/// Resource handle window around the active page
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub prefetch_before: usize,
    pub prefetch_after: usize,
    /// Extra live handles allowed beyond the prefetch window
    pub window_margin: usize,
    /// Slack kept on each side of the window before handles are revoked
    pub prune_buffer: usize,
}

impl CacheConfig {
    /// LRU bound covering the prefetch window plus the safety margin
    pub fn window_size(&self) -> usize {
        self.prefetch_before + self.prefetch_after + 1 + self.window_margin
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefetch_before: 1,
            prefetch_after: 1,
            window_margin: 2,
            prune_buffer: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Longest side of the downsampled analysis raster
    pub max_dimension: u32,
    /// Panel counts outside [min_panels, max_panels] collapse to the crop box
    pub min_panels: usize,
    pub max_panels: usize,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_dimension: 480,
            min_panels: 2,
            max_panels: 15,
            timeout_secs: 15,
        }
    }
}

/// Guided panel framing
#[derive(Debug, Clone, Deserialize)]
pub struct FocusConfig {
    /// Pixels reserved for the action buttons along the top edge
    pub top_inset: f32,
    /// Pixels reserved for the navigation arrows on each side
    pub side_inset: f32,
    pub bottom_inset: f32,
    pub min_scale: f32,
    pub max_scale_single: f32,
    pub max_scale_multi: f32,
    pub fill_factor: f32,
}

impl FocusConfig {
    /// Magnification ceiling, higher when several pages share the view
    pub fn max_scale(&self, pages_per_view: u8) -> f32 {
        if pages_per_view >= 2 {
            self.max_scale_multi
        } else {
            self.max_scale_single
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            top_inset: 62.0,
            side_inset: 52.0,
            bottom_inset: 44.0,
            min_scale: 0.6,
            max_scale_single: 8.0,
            max_scale_multi: 10.0,
            fill_factor: 0.99,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let cache = CacheConfig::default();
        let analysis = AnalysisConfig::default();

        let config = Config {
            cache: CacheConfig {
                prefetch_before: env_or("COMICS_PREFETCH_BEFORE", cache.prefetch_before)?,
                prefetch_after: env_or("COMICS_PREFETCH_AFTER", cache.prefetch_after)?,
                window_margin: env_or("COMICS_WINDOW_MARGIN", cache.window_margin)?,
                prune_buffer: env_or("COMICS_PRUNE_BUFFER", cache.prune_buffer)?,
            },
            analysis: AnalysisConfig {
                max_dimension: env_or("COMICS_ANALYSIS_MAX_DIM", analysis.max_dimension)?,
                min_panels: env_or("COMICS_MIN_PANELS", analysis.min_panels)?,
                max_panels: env_or("COMICS_MAX_PANELS", analysis.max_panels)?,
                timeout_secs: env_or("COMICS_ANALYSIS_TIMEOUT_SECS", analysis.timeout_secs)?,
            },
            focus: FocusConfig::default(),
        };

        if config.analysis.max_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "COMICS_ANALYSIS_MAX_DIM",
                value: "0".to_string(),
            });
        }
        if config.analysis.min_panels > config.analysis.max_panels {
            return Err(ConfigError::Invalid {
                key: "COMICS_MIN_PANELS",
                value: config.analysis.min_panels.to_string(),
            });
        }

        Ok(config)
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
