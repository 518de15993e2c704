//! Configuration file loading and error types.

use std::{fs, path::Path};

use splitroute_rules::RoutingConfig;
use tracing::debug;

use crate::AppDocument;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format")]
    UnsupportedFormat,
    #[error("{0}: missing proxy_rules.routing section")]
    MissingRouting(String),
}

/// Load the application document, choosing the parser by file extension
/// (`json`, `jsonc`, `yaml`, `yml`, `toml`).
pub fn load_document(path: impl AsRef<Path>) -> Result<AppDocument, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" | "jsonc" => {
            let stripped = json_comments::StripComments::new(data.as_bytes());
            Ok(serde_json::from_reader(stripped)?)
        }
        "yaml" | "yml" => Ok(serde_yaml::from_str(&data)?),
        "toml" => Ok(toml::from_str(&data)?),
        _ => Err(ConfigError::UnsupportedFormat),
    }
}

/// Load and resolve `proxy_rules.routing`. A document without the section
/// yields the default routing config.
pub fn load_routing(path: impl AsRef<Path>) -> Result<RoutingConfig, ConfigError> {
    let path = path.as_ref();
    let doc = load_document(path)?;
    if doc.routing().is_none() {
        debug!(path = %path.display(), "no routing section, using defaults");
    }
    Ok(doc.routing_or_default().resolve())
}

/// Like [`load_routing`] but fails when the section is missing.
pub fn load_routing_strict(path: impl AsRef<Path>) -> Result<RoutingConfig, ConfigError> {
    let path = path.as_ref();
    let doc = load_document(path)?;
    doc.routing()
        .map(|section| section.resolve())
        .ok_or_else(|| ConfigError::MissingRouting(path.display().to_string()))
}
