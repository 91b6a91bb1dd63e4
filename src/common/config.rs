use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub fn config_file() -> PathBuf { dirs::home_dir().unwrap().join(".mosaic.toml") }

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

/// Named numeric constants consumed by the engine. Read-only at runtime; a
/// changed file takes effect on the next engine construction.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Gap between mosaic windows, in pixels.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Distance from a screen edge within which a drag targets an edge zone.
    #[serde(default = "default_edge_zone_threshold")]
    pub edge_zone_threshold: f64,
    /// Floor for interactive tiled-pair rebalancing.
    #[serde(default = "default_min_tile_width")]
    pub min_tile_width: f64,
    #[serde(default = "default_min_tile_height")]
    pub min_tile_height: f64,
    #[serde(default = "yes")]
    pub animate: bool,
    /// Seconds.
    #[serde(default = "default_animation_duration")]
    pub animation_duration: f64,
    /// Cadence of the interactive reorder session, in milliseconds.
    #[serde(default = "default_reorder_tick_ms")]
    pub reorder_tick_ms: u64,
    /// Safety backstop for a drag whose end event was lost.
    #[serde(default = "default_reorder_timeout_ms")]
    pub reorder_timeout_ms: u64,
    /// Delay before re-packing after a geometry change, letting the host
    /// settle asynchronous frame updates.
    #[serde(default = "default_retile_settle_ms")]
    pub retile_settle_ms: u64,
    /// A lone mosaic window covering at least this fraction of the remaining
    /// width is auto-snapped opposite a freshly applied full tile.
    #[serde(default = "default_auto_snap_width_ratio")]
    pub auto_snap_width_ratio: f64,
    /// Mosaic windows exceeding this fraction of the remaining area migrate
    /// to a new workspace when a full tile is applied.
    #[serde(default = "default_migrate_area_ratio")]
    pub migrate_area_ratio: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            edge_zone_threshold: default_edge_zone_threshold(),
            min_tile_width: default_min_tile_width(),
            min_tile_height: default_min_tile_height(),
            animate: true,
            animation_duration: default_animation_duration(),
            reorder_tick_ms: default_reorder_tick_ms(),
            reorder_timeout_ms: default_reorder_timeout_ms(),
            retile_settle_ms: default_retile_settle_ms(),
            auto_snap_width_ratio: default_auto_snap_width_ratio(),
            migrate_area_ratio: default_migrate_area_ratio(),
        }
    }
}

impl Settings {
    pub fn reorder_tick(&self) -> Duration { Duration::from_millis(self.reorder_tick_ms) }

    pub fn reorder_timeout(&self) -> Duration { Duration::from_millis(self.reorder_timeout_ms) }

    pub fn retile_settle(&self) -> Duration { Duration::from_millis(self.retile_settle_ms) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.spacing < 0.0 {
            issues.push(format!("spacing must be non-negative, got {}", self.spacing));
        }

        if self.edge_zone_threshold <= 0.0 {
            issues.push(format!(
                "edge_zone_threshold must be positive, got {}",
                self.edge_zone_threshold
            ));
        }

        if self.min_tile_width <= 0.0 {
            issues.push(format!(
                "min_tile_width must be positive, got {}",
                self.min_tile_width
            ));
        }

        if self.min_tile_height <= 0.0 {
            issues.push(format!(
                "min_tile_height must be positive, got {}",
                self.min_tile_height
            ));
        }

        if self.animation_duration < 0.0 {
            issues.push(format!(
                "animation_duration must be non-negative, got {}",
                self.animation_duration
            ));
        }

        if self.reorder_tick_ms == 0 {
            issues.push("reorder_tick_ms must be at least 1".to_string());
        }

        if self.reorder_timeout_ms <= self.reorder_tick_ms {
            issues.push(format!(
                "reorder_timeout_ms ({}) must exceed reorder_tick_ms ({})",
                self.reorder_timeout_ms, self.reorder_tick_ms
            ));
        }

        if !(0.0..=1.0).contains(&self.auto_snap_width_ratio) {
            issues.push(format!(
                "auto_snap_width_ratio must be within 0..=1, got {}",
                self.auto_snap_width_ratio
            ));
        }

        if !(0.0..=1.0).contains(&self.migrate_area_ratio) {
            issues.push(format!(
                "migrate_area_ratio must be within 0..=1, got {}",
                self.migrate_area_ratio
            ));
        }

        issues
    }

    /// Attempts to fix invalid values automatically. Returns the number of
    /// fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.spacing < 0.0 {
            self.spacing = default_spacing();
            fixes += 1;
        }

        if self.edge_zone_threshold <= 0.0 {
            self.edge_zone_threshold = default_edge_zone_threshold();
            fixes += 1;
        }

        if self.min_tile_width <= 0.0 {
            self.min_tile_width = default_min_tile_width();
            fixes += 1;
        }

        if self.min_tile_height <= 0.0 {
            self.min_tile_height = default_min_tile_height();
            fixes += 1;
        }

        if self.animation_duration < 0.0 {
            self.animation_duration = default_animation_duration();
            fixes += 1;
        }

        if self.reorder_tick_ms == 0 {
            self.reorder_tick_ms = default_reorder_tick_ms();
            fixes += 1;
        }

        if self.reorder_timeout_ms <= self.reorder_tick_ms {
            self.reorder_timeout_ms = default_reorder_timeout_ms();
            fixes += 1;
        }

        if !(0.0..=1.0).contains(&self.auto_snap_width_ratio) {
            self.auto_snap_width_ratio = default_auto_snap_width_ratio();
            fixes += 1;
        }

        if !(0.0..=1.0).contains(&self.migrate_area_ratio) {
            self.migrate_area_ratio = default_migrate_area_ratio();
            fixes += 1;
        }

        fixes
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        Ok(Self::parse(&buf)?)
    }

    pub fn parse(buf: &str) -> Result<Config, ConfigError> { Ok(toml::from_str(buf)?) }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            settings: Settings::default(),
        }
    }
}

fn yes() -> bool { true }

fn default_spacing() -> f64 { 8.0 }

fn default_edge_zone_threshold() -> f64 { 32.0 }

fn default_min_tile_width() -> f64 { 200.0 }

fn default_min_tile_height() -> f64 { 150.0 }

fn default_animation_duration() -> f64 { 0.25 }

fn default_reorder_tick_ms() -> u64 { 50 }

fn default_reorder_timeout_ms() -> u64 { 10_000 }

fn default_retile_settle_ms() -> u64 { 80 }

fn default_auto_snap_width_ratio() -> f64 { 0.8 }

fn default_migrate_area_ratio() -> f64 { 0.7 }

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config_parses_to_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [settings]
            spacing = 12.0
            reorder_tick_ms = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.spacing, 12.0);
        assert_eq!(config.settings.reorder_tick_ms, 25);
        assert_eq!(config.settings.edge_zone_threshold, 32.0);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::parse(
            r#"
            [settings]
            spackle = 1.0
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn validation_and_auto_fix() {
        let mut config = Config::default();
        assert!(config.validate().is_empty());

        config.settings.spacing = -4.0;
        config.settings.auto_snap_width_ratio = 1.4;
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("spacing must be non-negative"));

        let fixes = config.auto_fix_values();
        assert_eq!(fixes, 2);
        assert_eq!(config.settings.spacing, 8.0);
        assert_eq!(config.settings.auto_snap_width_ratio, 0.8);
    }

    #[test]
    fn timeout_must_exceed_tick() {
        let mut config = Config::default();
        config.settings.reorder_timeout_ms = 10;
        assert_eq!(config.validate().len(), 1);
        config.auto_fix_values();
        assert_eq!(config.settings.reorder_timeout_ms, 10_000);
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.toml");

        let mut config = Config::default();
        config.settings.spacing = 16.0;
        config.save(&path).unwrap();

        let loaded = Config::read(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
