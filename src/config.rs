use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::client::SessionContext;
use crate::error::ConfigError;
use crate::timetable::{default_slots, SlotConfig};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime settings, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub port: u16,
    pub output_dir: PathBuf,
    /// Set only when both STUDENT_ID and API_TOKEN are present
    pub identity: Option<SessionContext>,
    pub slots: SlotConfig,
}

/// Layout of a `TIMETABLE_SLOTS` file
#[derive(Debug, Clone, Deserialize)]
pub struct SlotFile {
    pub boundaries: Vec<String>,
    pub day_end: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = var("TIMETABLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let port = match var("PORT") {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };
        let output_dir = var("TIMETABLE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let identity = match (var("STUDENT_ID"), var("API_TOKEN")) {
            (Some(student_id), Some(token)) => Some(SessionContext::new(student_id, token)),
            _ => None,
        };
        let slots = match var("TIMETABLE_SLOTS") {
            Some(path) => load_slot_file(path)?,
            None => default_slots(),
        };

        Ok(Config {
            api_base_url,
            port,
            output_dir,
            identity,
            slots,
        })
    }
}

pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigError::BadPort(raw.to_string()))
}

/// Reads slot boundaries from a JSON file
pub fn load_slot_file<P: AsRef<Path>>(path: P) -> Result<SlotConfig, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    let file: SlotFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })?;
    SlotConfig::from_boundaries(file.boundaries.as_slice(), &file.day_end)
}
