//! Local panel caching
//!
//! Validated panels are expensive to derive (one implied-vol solve per row), so
//! they are cached as JSON keyed by underlying and panel configuration. Each
//! entry records a fingerprint of the observations and rates it was built from
//! and is only served for the same inputs.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::{HedgeResult, RateCurve};
use crate::panel::{PanelBuilder, PanelConfig, ValidatedPanel};

use super::RawPanel;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Cache directory
    pub cache_dir: PathBuf,
    /// Maximum age before rebuild (in hours)
    pub max_age_hours: i64,
    /// Whether to use cache
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/cache"),
            max_age_hours: 24,
            enabled: true,
        }
    }
}

/// SHA-256 over the serialized observations and rate curve
pub fn input_fingerprint(raw: &RawPanel, curve: &RateCurve) -> HedgeResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(raw.rows())?);
    hasher.update(serde_json::to_vec(curve)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// On-disk cache entry
#[derive(Serialize, Deserialize)]
struct CachedPanel {
    fingerprint: String,
    panel: ValidatedPanel,
}

/// Validated panel cache
pub struct PanelCache {
    config: CacheConfig,
}

impl PanelCache {
    pub fn new(config: CacheConfig) -> HedgeResult<Self> {
        if config.enabled && !config.cache_dir.exists() {
            fs::create_dir_all(&config.cache_dir)?;
        }

        Ok(Self { config })
    }

    /// Cache file for an underlying and panel configuration
    fn cache_key(&self, underlying: &str, panel: &PanelConfig) -> PathBuf {
        let vega = if panel.compute_vega { "_vega" } else { "" };
        self.config.cache_dir.join(format!(
            "{}_{}d_{}d{}_panel.json",
            underlying, panel.validation_window_days, panel.tenor_window_days, vega
        ))
    }

    /// Check if cache is valid (exists and not expired)
    pub fn is_valid(&self, underlying: &str, panel: &PanelConfig) -> bool {
        if !self.config.enabled {
            return false;
        }

        let path = self.cache_key(underlying, panel);
        let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
            return false;
        };

        let modified: DateTime<Utc> = modified.into();
        Utc::now() - modified < Duration::hours(self.config.max_age_hours)
    }

    /// Save a validated panel built from inputs with `fingerprint`
    pub fn save_panel(&self, underlying: &str, fingerprint: &str, panel: &ValidatedPanel) -> HedgeResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let path = self.cache_key(underlying, &panel.config);
        let entry = CachedPanel {
            fingerprint: fingerprint.to_string(),
            panel: panel.clone(),
        };
        let json = serde_json::to_string(&entry)?;
        fs::write(&path, json)?;

        tracing::info!("Cached panel for {} at {:?}", underlying, path);
        Ok(())
    }

    /// Load a validated panel built with exactly `config` from inputs with
    /// `fingerprint`
    pub fn load_panel(
        &self,
        underlying: &str,
        config: &PanelConfig,
        fingerprint: &str,
    ) -> HedgeResult<Option<ValidatedPanel>> {
        if !self.is_valid(underlying, config) {
            return Ok(None);
        }

        let json = fs::read_to_string(self.cache_key(underlying, config))?;
        let entry: CachedPanel = serde_json::from_str(&json)?;

        if entry.fingerprint != fingerprint {
            tracing::info!("Inputs for {} changed since the panel was cached", underlying);
            return Ok(None);
        }
        let panel = entry.panel;

        // Bands are not part of the file name
        if &panel.config != config {
            return Ok(None);
        }

        tracing::info!("Loaded panel for {} from cache", underlying);
        Ok(Some(panel))
    }

    /// Clear cache for an underlying
    pub fn clear(&self, underlying: &str) -> HedgeResult<()> {
        if !self.config.cache_dir.exists() {
            return Ok(());
        }

        let prefix = format!("{}_", underlying);
        for entry in fs::read_dir(&self.config.cache_dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            if file_name.starts_with(&prefix) && file_name.ends_with("_panel.json") {
                fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// List cached underlyings
    pub fn list_cached(&self) -> HedgeResult<Vec<String>> {
        let mut underlyings = Vec::new();

        if !self.config.cache_dir.exists() {
            return Ok(underlyings);
        }

        for entry in fs::read_dir(&self.config.cache_dir)? {
            let file_name = entry?.file_name().to_string_lossy().to_string();

            if let Some(stem) = file_name.strip_suffix("_panel.json") {
                // <underlying>_<validation>d_<tenor>d[_vega]
                let underlying = stem
                    .trim_end_matches("_vega")
                    .rsplitn(3, '_')
                    .nth(2)
                    .unwrap_or(stem)
                    .to_string();
                if !underlyings.contains(&underlying) {
                    underlyings.push(underlying);
                }
            }
        }

        underlyings.sort();
        Ok(underlyings)
    }
}

/// Cached panel builder - combines cache with the validation pipeline
pub struct CachedPanelBuilder {
    cache: PanelCache,
    builder: PanelBuilder,
}

impl CachedPanelBuilder {
    pub fn new(cache: CacheConfig, panel: PanelConfig) -> HedgeResult<Self> {
        Ok(Self {
            cache: PanelCache::new(cache)?,
            builder: PanelBuilder::with_config(panel),
        })
    }

    /// Get the validated panel (from cache or rebuilt)
    pub fn get_panel(
        &self,
        underlying: &str,
        raw: &RawPanel,
        curve: &RateCurve,
    ) -> HedgeResult<ValidatedPanel> {
        let fingerprint = input_fingerprint(raw, curve)?;
        if let Some(panel) = self.cache.load_panel(underlying, self.builder.config(), &fingerprint)? {
            return Ok(panel);
        }

        tracing::info!("Building panel for {}", underlying);
        let panel = self.builder.build(raw, curve)?;
        self.cache.save_panel(underlying, &fingerprint, &panel)?;

        Ok(panel)
    }

    /// Force rebuild (bypass cache)
    pub fn rebuild_panel(
        &self,
        underlying: &str,
        raw: &RawPanel,
        curve: &RateCurve,
    ) -> HedgeResult<ValidatedPanel> {
        self.cache.clear(underlying)?;
        self.get_panel(underlying, raw, curve)
    }
}
