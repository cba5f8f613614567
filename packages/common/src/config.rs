use serde::{Deserialize, Serialize};

use crate::entry::DEFAULT_FILENAME_PREFIX;
use crate::error::{RecorderError, RecorderResult};
use crate::format::DEFAULT_MIME_CANDIDATES;
use crate::store::DEFAULT_STORAGE_KEY;

/// Cursor visibility requested from display capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    Always,
    Motion,
    Never,
}

impl CursorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorMode::Always => "always",
            CursorMode::Motion => "motion",
            CursorMode::Never => "never",
        }
    }
}

/// Ids of the page elements the recorder drives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementIds {
    pub record_button: String,
    pub stop_button: String,
    pub video: String,
    pub recordings_list: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            record_button: "recordButton".to_string(),
            stop_button: "stopButton".to_string(),
            video: "videoElement".to_string(),
            recordings_list: "recordingsList".to_string(),
        }
    }
}

/// Configuration for the recorder page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    /// localStorage key of the recordings list
    pub storage_key: String,
    pub filename_prefix: String,
    /// Recorder MIME types in order of preference
    pub mime_candidates: Vec<String>,
    pub cursor: CursorMode,
    pub capture_audio: bool,
    /// Console log level ("error", "warn", "info", "debug", "trace", "off")
    pub log_level: String,
    pub elements: ElementIds,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            mime_candidates: DEFAULT_MIME_CANDIDATES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
            cursor: CursorMode::Always,
            capture_audio: false,
            log_level: "info".to_string(),
            elements: ElementIds::default(),
        }
    }
}

impl RecorderConfig {
    /// Parse a JSON object; missing fields keep their defaults
    pub fn from_json(raw: &str) -> RecorderResult<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| RecorderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RecorderResult<()> {
        if self.storage_key.is_empty() {
            return Err(RecorderError::Config("storageKey must not be empty".to_string()));
        }
        if self.filename_prefix.is_empty() {
            return Err(RecorderError::Config(
                "filenamePrefix must not be empty".to_string(),
            ));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(RecorderError::Config(format!(
                "unknown logLevel {:?}",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
