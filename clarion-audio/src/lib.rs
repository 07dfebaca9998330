//! Implements the clarion collaborator traits on top of kira.

mod engine;
mod loader;
#[cfg(test)]
mod test_util;

use serde::Deserialize;

pub use engine::{KiraChannel, KiraClip, KiraEngine};
pub use loader::FileAssetLoader;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KiraSettings {
    /// Length of the fade-out applied when a channel is stopped, in milliseconds.
    pub stop_fade_ms: u64,
}

impl Default for KiraSettings {
    fn default() -> Self {
        Self { stop_fade_ms: 15 }
    }
}
