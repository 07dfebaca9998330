use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioSettings {
    /// Folder prefix prepended to clip names when asking the asset loader for a clip.
    pub clip_prefix: String,
    /// Number of sound channels created up-front and parked in the free list.
    pub initial_sound_channels: usize,
    /// How many scheduler ticks per second the driver is expected to run.
    pub tick_rate: u32,
}

impl AudioSettings {
    pub fn clip_path(&self, name: &str) -> String {
        clip_path(&self.clip_prefix, name)
    }
}

pub(crate) fn clip_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            clip_prefix: "Audios".to_string(),
            initial_sound_channels: 0,
            tick_rate: 60,
        }
    }
}
