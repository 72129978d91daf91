// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for activity reports.

use crate::model::{PresetTags, WeekCount};
use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Tags reported as their own categories, in tie-break order.
    pub preset_tags: Vec<String>,

    /// Weeks covered by `report` when `--weeks` is not given.
    pub default_weeks: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            preset_tags: vec![
                "#gettingup".to_string(),
                "#running".to_string(),
                "#reading".to_string(),
            ],
            default_weeks: 4,
        }
    }
}

/// Defaults for the sample-data generator.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedConfig {
    pub weeks: u32,

    /// Tags outside the preset list that generated posts may carry.
    pub extra_tags: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            weeks: 4,
            extra_tags: vec!["#cooking".to_string(), "#travel".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path.as_std_path())
            .with_context(|| format!("failed to read config file at {}", path))?;

        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file at {}", path))
    }

    /// Load configuration, falling back to defaults if the file does not exist.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(%path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// The validated preset tag list.
    pub fn preset_tags(&self) -> Result<PresetTags> {
        PresetTags::new(self.report.preset_tags.iter().cloned())
            .context("invalid report.preset_tags in configuration")
    }

    /// The validated default week count.
    pub fn default_weeks(&self) -> Result<WeekCount> {
        WeekCount::new(self.report.default_weeks)
            .context("invalid report.default_weeks in configuration")
    }
}
