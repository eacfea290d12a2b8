use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Caller-supplied parameters for one synthesis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AutoConfigSettings {
    pub namespace: String,
    pub orchestrator_name: String,
    pub generation_service: String,
    pub include_builtin_detectors: bool,
    /// Read the directory from a YAML snapshot instead of the cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

impl AutoConfigSettings {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("failed to parse settings at {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            bail!("namespace is required");
        }
        if self.orchestrator_name.trim().is_empty() {
            bail!("orchestrator name is required");
        }
        if self.generation_service.trim().is_empty() {
            bail!("generation service name is required");
        }
        Ok(())
    }
}
