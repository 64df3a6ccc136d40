//! # Configuration
//!
//! Planner defaults are loaded with [`confique`] from, in priority order:
//!
//! 1. **Environment variables**: `TRIPKIT_CURRENCY`, `TRIPKIT_TRAVEL_MODE`, ...
//! 2. **Config file**: a TOML file passed to [`PlannerConfig::load`].
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `currency` | `KRW` | Currency of newly created trips |
//! | `travel_mode` | `walk` | Default travel mode of new trips |
//! | `default_trip_title` | `새 여행` | Title used when a template cannot be found |
//! | `default_nights` | `1` | Length used when a template cannot be found |
//! | `data_dir` | OS data dir | Where the filesystem backend keeps trips |
//! | `template_dir` | none | Extra `*.json` templates merged over the built-in ones |
//! | `log_level` | `info` | `tracing` filter directive |
//! | `log_json` | `false` | Emit JSON log lines |

use std::path::{Path, PathBuf};

use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{TravelMode, UnknownTravelMode};

const DEFAULT_TRIP_TITLE: &str = "새 여행";

fn parse_travel_mode(raw: &str) -> std::result::Result<TravelMode, UnknownTravelMode> {
    raw.parse()
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// ISO currency code for new trips.
    #[config(default = "KRW", env = "TRIPKIT_CURRENCY")]
    pub currency: String,

    #[config(default = "walk", env = "TRIPKIT_TRAVEL_MODE", parse_env = parse_travel_mode)]
    pub travel_mode: TravelMode,

    #[config(default = "새 여행", env = "TRIPKIT_DEFAULT_TRIP_TITLE")]
    pub default_trip_title: String,

    #[config(default = 1, env = "TRIPKIT_DEFAULT_NIGHTS")]
    pub default_nights: u32,

    /// When absent, the OS data directory is used (see [`PlannerConfig::data_dir`]).
    #[config(env = "TRIPKIT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[config(env = "TRIPKIT_TEMPLATE_DIR")]
    pub template_dir: Option<PathBuf>,

    #[config(default = "info", env = "TRIPKIT_LOG")]
    pub log_level: String,

    #[config(default = false, env = "TRIPKIT_LOG_JSON")]
    pub log_json: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            currency: crate::commands::trips::DEFAULT_CURRENCY.to_string(),
            travel_mode: TravelMode::default(),
            default_trip_title: DEFAULT_TRIP_TITLE.to_string(),
            default_nights: crate::commands::trips::MIN_NIGHTS,
            data_dir: None,
            template_dir: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl PlannerConfig {
    /// Loads environment overrides on top of `path` (if given) on top of the
    /// compiled defaults. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    /// The configured data directory, or the OS-appropriate one.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| ProjectDirs::from("", "", "tripkit").map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".tripkit"))
    }
}
