use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::ReadsError;

pub const DEFAULT_CONFIG_FILE: &str = "reads-to-fastq.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "workspace-url")]
    pub workspace_url: String,
    #[serde(rename = "shock-url", default)]
    pub shock_url: Option<String>,
    #[serde(default)]
    pub scratch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub workspace_url: String,
    pub blob_store_url: Option<String>,
    pub scratch: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ReadsError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(ReadsError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ReadsError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ReadsError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ReadsError> {
        if config.workspace_url.trim().is_empty() {
            return Err(ReadsError::ConfigParse(
                "workspace-url must not be empty".to_string(),
            ));
        }

        let scratch = match config.scratch.filter(|value| !value.trim().is_empty()) {
            Some(value) => Utf8PathBuf::from(value),
            None => default_scratch()?,
        };

        Ok(ResolvedConfig {
            workspace_url: config.workspace_url,
            blob_store_url: config.shock_url.filter(|value| !value.trim().is_empty()),
            scratch,
        })
    }
}

pub fn default_scratch() -> Result<Utf8PathBuf, ReadsError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.cache_dir().join("reads-to-fastq").join("scratch"))
                .ok()
        })
        .ok_or_else(|| ReadsError::Filesystem("unable to resolve scratch directory".to_string()))
}
