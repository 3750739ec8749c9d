// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel-wide configuration

use crate::csg::{BooleanEngine, CsgOptions, HistoryConfig};
use crate::validation::{RepairOptions, ValidationConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default file looked up by [`KernelConfig::load`]
pub const CONFIG_FILE: &str = "polyedit.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Distance under which two positions are the same point
    pub tolerance: f64,
    pub validation: ValidationConfig,
    pub csg: CsgOptions,
    pub history: HistoryConfig,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            validation: ValidationConfig::default(),
            csg: CsgOptions::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl KernelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `polyedit.toml` from the working directory when present, then
    /// apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `POLYEDIT_*` overrides fetched through `lookup`. Unparseable
    /// values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("POLYEDIT_TOLERANCE") {
            match raw.parse::<f64>() {
                Ok(tolerance) if tolerance.is_finite() && tolerance >= 0.0 => self.set_tolerance(tolerance),
                _ => warn!("Ignoring POLYEDIT_TOLERANCE={raw}"),
            }
        }

        if let Some(raw) = lookup("POLYEDIT_HISTORY_MAX") {
            match raw.parse() {
                Ok(max_entries) => self.history.max_entries = max_entries,
                Err(_) => warn!("Ignoring POLYEDIT_HISTORY_MAX={raw}"),
            }
        }

        if let Some(raw) = lookup("POLYEDIT_CHECK_UV_BOUNDS") {
            match raw.parse() {
                Ok(check) => self.validation.check_uv_bounds = check,
                Err(_) => warn!("Ignoring POLYEDIT_CHECK_UV_BOUNDS={raw}"),
            }
        }
    }

    /// Set the shared tolerance and propagate it to CSG and validation
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
        self.csg.tolerance = tolerance;
        self.validation.position_tolerance = tolerance;
    }

    pub fn repair_options(&self) -> RepairOptions {
        RepairOptions {
            weld_tolerance: Some(self.tolerance),
            area_epsilon: self.validation.area_epsilon,
            ..RepairOptions::default()
        }
    }

    pub fn boolean_engine(&self) -> BooleanEngine {
        BooleanEngine::new(self.csg.clone(), &self.history)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
