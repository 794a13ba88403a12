//! Service configuration.
//!
//! Defaults, then an optional JSON file named by `STEM_SPLITTER_CONFIG`, then
//! `STEM_SPLITTER_*` environment overrides. CLI flags are applied last by the
//! binary.

use crate::error::{Result, ServiceError};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const CONFIG_ENV: &str = "STEM_SPLITTER_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub python: PathBuf,
    pub ffmpeg: PathBuf,
    pub registry_path: Option<PathBuf>,
    pub default_model: String,
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            upload_dir: PathBuf::from("/tmp/stem-splitter-uploads"),
            output_dir: PathBuf::from("/tmp/stem-splitter-outputs"),
            python: PathBuf::from("python3"),
            ffmpeg: PathBuf::from("ffmpeg"),
            registry_path: None,
            default_model: "htdemucs".to_string(),
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var_os(CONFIG_ENV) {
            Some(p) => Self::load_from_path(Path::new(&p))?,
            None => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok());
        Ok(cfg)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| {
            ServiceError::Anyhow(anyhow::anyhow!("Invalid config {}: {e}", path.display()))
        })
    }

    /// Overrides fields from `STEM_SPLITTER_*` variables as seen by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("STEM_SPLITTER_LISTEN") {
            self.listen_addr = v;
        }
        if let Some(v) = lookup("STEM_SPLITTER_UPLOAD_DIR") {
            self.upload_dir = v.into();
        }
        if let Some(v) = lookup("STEM_SPLITTER_OUTPUT_DIR") {
            self.output_dir = v.into();
        }
        if let Some(v) = lookup("STEM_SPLITTER_PYTHON") {
            self.python = v.into();
        }
        if let Some(v) = lookup("STEM_SPLITTER_FFMPEG") {
            self.ffmpeg = v.into();
        }
        if let Some(v) = lookup("STEM_SPLITTER_REGISTRY") {
            self.registry_path = Some(v.into());
        }
    }

    /// Ensure required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_dir)?;
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}
