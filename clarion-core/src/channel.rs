use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{backend::AudioChannel, clip::Clip};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelCategory {
    Bgm,
    Voice,
    Sound,
}

impl ChannelCategory {
    /// Whether playback in this category loops when the caller doesn't say otherwise.
    pub fn loops_by_default(self) -> bool {
        matches!(self, ChannelCategory::Bgm)
    }
}

/// Identifies a channel owned by an [`AudioManager`](crate::AudioManager).
///
/// Sound channels are addressed by their slot index in the pool. Slots are never freed, so an id
/// stays valid for the lifetime of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Bgm,
    Voice,
    Sound(usize),
}

impl ChannelId {
    pub fn category(self) -> ChannelCategory {
        match self {
            ChannelId::Bgm => ChannelCategory::Bgm,
            ChannelId::Voice => ChannelCategory::Voice,
            ChannelId::Sound(_) => ChannelCategory::Sound,
        }
    }

    pub fn is_pooled(self) -> bool {
        matches!(self, ChannelId::Sound(_))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Bgm => write!(f, "bgm"),
            ChannelId::Voice => write!(f, "voice"),
            ChannelId::Sound(index) => write!(f, "sound-{}", index),
        }
    }
}

/// A snapshot of the channel state, as seen by the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub clip: Option<String>,
    pub volume: f32,
    pub looped: bool,
    pub playing: bool,
    pub active: bool,
}

pub(crate) struct Channel<C: AudioChannel> {
    id: ChannelId,
    backend: C,
    clip: Option<Arc<Clip<C::Payload>>>,
    volume: f32,
    looped: bool,
    active: bool,
}

impl<C: AudioChannel> Channel<C> {
    pub fn new(id: ChannelId, backend: C) -> Self {
        Self {
            id,
            backend,
            clip: None,
            volume: 1.0,
            looped: false,
            active: true,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Puts the clip and playback parameters on the channel, replacing whatever was there.
    pub fn assign(&mut self, clip: Arc<Clip<C::Payload>>, volume: f32, looped: bool) {
        self.backend.set_clip(&clip);
        self.backend.set_volume(volume);
        self.backend.set_looped(looped);

        self.clip = Some(clip);
        self.volume = volume;
        self.looped = looped;
    }

    pub fn play(&mut self) {
        self.backend.play();
    }

    pub fn stop(&mut self) {
        self.backend.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.backend.is_playing()
    }

    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            debug!("Channel {} active: {}", self.id, active);
        }
        self.active = active;
        self.backend.set_active(active);
    }

    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            id: self.id,
            clip: self.clip.as_ref().map(|c| c.name().to_string()),
            volume: self.volume,
            looped: self.looped,
            playing: self.backend.is_playing(),
            active: self.active,
        }
    }
}
