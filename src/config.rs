use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::quote::{DEFAULT_INTERVAL_SECS, clamp_interval};

pub const CONFIG_VERSION: u64 = 1;

pub const DEFAULT_QUOTE_URL: &str = "https://v1.hitokoto.cn?c=i&c=k";
pub const DEFAULT_DAILY_IMAGE_URL: &str = "https://bing.ee123.net/img/4k";

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("studyboard")
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, CosmicConfigEntry)]
pub struct BoardConfig {
    pub data_directory: PathBuf,
    pub quote_url: String,
    pub daily_image_url: String,
    pub quote_interval_secs: u32,
    pub debug_logging: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            quote_url: DEFAULT_QUOTE_URL.to_string(),
            daily_image_url: DEFAULT_DAILY_IMAGE_URL.to_string(),
            quote_interval_secs: DEFAULT_INTERVAL_SECS,
            debug_logging: false,
        }
    }
}

impl BoardConfig {
    pub fn background_path(&self) -> PathBuf {
        self.data_directory.join("background.json")
    }

    pub fn subjects_path(&self) -> PathBuf {
        self.data_directory.join("subjects.json")
    }

    /// Stored interval, pulled back into the accepted range if the config was hand-edited.
    pub fn quote_interval(&self) -> u32 {
        clamp_interval(self.quote_interval_secs)
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_directory)
    }
}
