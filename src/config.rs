//! JSON configuration: component catalog, light sources and control defaults.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::model::{CatalogEntry, CatalogSource, LightSourceEntry, VendorFormat};
use crate::optics::chain::{DEFAULT_FIBER_LENGTH, validate_distance};
use crate::optics::session::DEFAULT_DISTANCE;

/// Top-level configuration. Every field has a default, so `{}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OD multiplier applied to fibers.
    pub fiber_length: f64,
    /// Sample distance at startup (mm).
    pub default_distance: f64,
    /// Upper end of the distance slider (mm).
    pub max_distance: f64,
    pub components: Vec<CatalogEntry>,
    pub light_sources: Vec<LightSourceEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        use VendorFormat::{Semrock, Thorlabs};
        Self {
            fiber_length: DEFAULT_FIBER_LENGTH,
            default_distance: DEFAULT_DISTANCE,
            max_distance: 20.0,
            components: vec![
                CatalogEntry::file(
                    "Thorlabs 450/10",
                    "csv_data/thorlabs/FB450-10_Spectrum.csv",
                    Thorlabs,
                ),
                CatalogEntry::file(
                    "Thorlabs 450 LP",
                    "csv_data/thorlabs/FEL0450_Spectrum.csv",
                    Thorlabs,
                ),
                CatalogEntry::file(
                    "Semrock 468 SP",
                    "csv_data/semrock/FF01-468_SP_Spectrum.csv",
                    Semrock,
                ),
                CatalogEntry::file(
                    "Semrock 460/14",
                    "csv_data/semrock/FF01-460-14_Spectrum.csv",
                    Semrock,
                ),
                CatalogEntry::file(
                    "Semrock 442 LP",
                    "csv_data/semrock/BLP01-442R_Spectrum.csv",
                    Semrock,
                ),
                CatalogEntry::file(
                    "Semrock 430 LP",
                    "csv_data/semrock/FF01-430_LP_Spectrum.csv",
                    Semrock,
                ),
                CatalogEntry::fiber("Fiber"),
            ],
            light_sources: vec![
                LightSourceEntry::new("445nm Blue", "csv_data/laser/no_filter_laser.csv"),
                LightSourceEntry::new("540nm Green", "csv_data/laser/single_filter_laser.parquet"),
            ],
        }
    }
}

impl AppConfig {
    /// Read a JSON config. Relative file paths inside it are taken relative
    /// to the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config =
            Self::from_json(&text).with_context(|| format!("in config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fiber_length.is_finite() || self.fiber_length <= 0.0 {
            bail!("fiber_length must be positive, got {}", self.fiber_length);
        }
        validate_distance(self.default_distance).context("default_distance")?;
        if self.max_distance.is_nan() || self.max_distance < self.default_distance {
            bail!(
                "max_distance {} is below default_distance {}",
                self.max_distance,
                self.default_distance
            );
        }

        let mut seen = BTreeSet::new();
        for entry in &self.components {
            if !seen.insert(entry.name.as_str()) {
                bail!("duplicate component name '{}'", entry.name);
            }
        }
        let mut seen = BTreeSet::new();
        for entry in &self.light_sources {
            if !seen.insert(entry.name.as_str()) {
                bail!("duplicate light source name '{}'", entry.name);
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for entry in &mut self.components {
            if let CatalogSource::File { path, .. } = &mut entry.source {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
        for entry in &mut self.light_sources {
            if entry.path.is_relative() {
                entry.path = base.join(&entry.path);
            }
        }
    }

    pub fn component(&self, name: &str) -> Option<&CatalogEntry> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn light_source(&self, name: &str) -> Option<&LightSourceEntry> {
        self.light_sources.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optics::ElementKind;

    #[test]
    fn test_defaults_mirror_catalog() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.components.len(), 7);
        assert_eq!(config.component("Fiber").unwrap().source.kind(), ElementKind::Fiber);
        assert_eq!(
            config.component("Semrock 460/14").unwrap().source.kind(),
            ElementKind::Filter
        );
        assert!(config.light_source("445nm Blue").is_some());
        assert_eq!(config.default_distance, 1.0);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_json(
            r#"{"fiber_length": 2.5, "default_distance": 3,
                "components": [{"name": "Patch cord", "source": "fiber"}]}"#,
        )
        .unwrap();
        assert_eq!(config.fiber_length, 2.5);
        assert_eq!(config.default_distance, 3.0);
        assert_eq!(config.components, vec![CatalogEntry::fiber("Patch cord")]);
        assert_eq!(config.light_sources.len(), 2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(AppConfig::from_json(r#"{"fiber_length": 0}"#).is_err());
        assert!(AppConfig::from_json(r#"{"default_distance": -1}"#).is_err());
        assert!(AppConfig::from_json(r#"{"default_distance": 5, "max_distance": 2}"#).is_err());
        assert!(
            AppConfig::from_json(
                r#"{"components": [{"name": "A", "source": "fiber"},
                                   {"name": "A", "source": "fiber"}]}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = std::env::temp_dir().join(format!("optical-path-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("optical-path.json");
        std::fs::write(
            &path,
            r#"{"light_sources": [{"name": "Blue", "path": "laser.csv"}]}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.light_source("Blue").unwrap().path, dir.join("laser.csv"));
        match &config.component("Semrock 430 LP").unwrap().source {
            CatalogSource::File { path, .. } => assert!(path.starts_with(&dir)),
            CatalogSource::Fiber => panic!("expected a file entry"),
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
