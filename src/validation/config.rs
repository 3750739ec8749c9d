// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Validation configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tolerances and policies of a validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Quantization step for duplicate-position detection
    pub position_tolerance: f64,
    /// Faces with less area than this are reported as degenerate
    pub area_epsilon: f64,
    /// Warn about UVs outside [0, 1]
    pub check_uv_bounds: bool,
    /// Warn about vertices no face or edge references
    pub warn_orphans: bool,
    /// Warn when only some vertices carry normals or UVs
    pub warn_missing_attributes: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            position_tolerance: 1e-6,
            area_epsilon: 1e-12,
            check_uv_bounds: true,
            warn_orphans: true,
            warn_missing_attributes: false,
        }
    }
}

impl ValidationConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ValidationConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Strict profile: every warning category enabled
    pub fn strict() -> Self {
        Self {
            warn_missing_attributes: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ValidationConfig = toml::from_str("check_uv_bounds = false").unwrap();
        assert!(!config.check_uv_bounds);
        assert_eq!(config.position_tolerance, 1e-6);
        assert!(config.warn_orphans);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validation.toml");
        let config = ValidationConfig::strict();
        config.save(&path).unwrap();
        assert_eq!(ValidationConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = ValidationConfig::from_file("/nonexistent/validation.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
