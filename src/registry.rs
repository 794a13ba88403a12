use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sources: Vec<String>,
}

impl ModelEntry {
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn has_source(&self, stem: &str) -> bool {
        self.canonical_source(stem).is_some()
    }

    /// The registry's spelling of `stem`, matched case-insensitively.
    pub fn canonical_source(&self, stem: &str) -> Option<String> {
        self.sources
            .iter()
            .find(|s| s.eq_ignore_ascii_case(stem))
            .cloned()
    }

    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Demucs model: {}", self.name))
    }
}

/// Pretrained separation models known to the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Registry {
    pub models: Vec<ModelEntry>,
}

const REGISTRY_JSON: &str = include_str!("../models/registry.json");

impl Registry {
    pub fn embedded() -> Result<Self> {
        Self::parse(REGISTRY_JSON)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ServiceError::Registry(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self> {
        let reg: Registry = serde_json::from_str(raw)
            .map_err(|e| ServiceError::Registry(format!("Invalid registry: {e}")))?;
        if reg.models.is_empty() {
            return Err(ServiceError::Registry("Registry lists no models".into()));
        }
        Ok(reg)
    }

    pub fn find(&self, model_name: &str) -> Result<&ModelEntry> {
        self.models
            .iter()
            .find(|m| m.name == model_name)
            .ok_or_else(|| {
                ServiceError::Registry(format!("Model `{model_name}` not found in registry"))
            })
    }
}
