// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on `picker.count`; the whole list has to fit on screen for
/// the in-place redraw to work.
pub const MAX_PICK_COUNT: usize = 20;

pub const DEFAULT_FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml?playlist_id=";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub sources: Vec<SourceConfig>,
    pub player: PlayerConfig,
    pub picker: PickerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
}

/// A playlist queried for its newest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub playlist_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub autofit_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub count: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn new(name: &str, playlist_id: &str) -> Self {
        Self {
            name: name.to_string(),
            playlist_id: playlist_id.to_string(),
        }
    }

    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            Self::new("Drumcode Radio", "PLhkZrfli9PCoqrzwkAg2RMAHKzEeVzM2X"),
            Self::new("Drumcode Streams", "PLhkZrfli9PCrVtlDxynDixY2frHBq_MYW"),
            Self::new("Adam Beyer Live", "PLhkZrfli9PCqFDIT3_jSAsOVYRhfrVNXF"),
        ]
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: "mpv".to_string(),
            args: Vec::new(),
            autofit_height: 384,
        }
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self { count: 3 }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("drumcode").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    /// Loads `explicit` if given, otherwise the default location when it
    /// exists, otherwise the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;

        // An empty or omitted source list falls back to the curated playlists
        if config.sources.is_empty() {
            config.sources = SourceConfig::default_sources();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.feed.base_url)
            .with_context(|| format!("Invalid feed base_url: {}", self.feed.base_url))?;

        if self.picker.count == 0 {
            anyhow::bail!("picker.count must be at least 1");
        }

        if self.picker.count > MAX_PICK_COUNT {
            anyhow::bail!("picker.count must be at most {}", MAX_PICK_COUNT);
        }

        if self.player.command.trim().is_empty() {
            anyhow::bail!("player.command must not be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            sources: SourceConfig::default_sources(),
            player: PlayerConfig::default(),
            picker: PickerConfig::default(),
        }
    }
}
