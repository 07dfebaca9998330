use std::path::Path;

use anyhow::{Context, Result};
use clarion_audio::KiraSettings;
use clarion_core::AudioSettings;
use serde::Deserialize;
use tracing::debug;

/// Contents of the YAML configuration file. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub audio: AudioSettings,
    pub kira: KiraSettings,
}

impl Config {
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Parsing configuration")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Reading configuration file {:?}", path))?;
        Self::parse(&yaml).with_context(|| format!("Loading configuration file {:?}", path))
    }
}
