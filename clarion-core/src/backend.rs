//! Traits for the collaborators the manager delegates to: the audio engine that owns the actual
//! playable channels, and the asset loader producing clip payloads.

use std::time::Duration;

use crate::{channel::ChannelCategory, clip::Clip, error::LoadError};

/// Opaque audio data owned by the engine.
pub trait ClipPayload: 'static {
    fn duration(&self) -> Duration;
}

/// A single playable unit, able to hold one clip at a time.
pub trait AudioChannel: 'static {
    type Payload: ClipPayload;

    fn set_clip(&mut self, clip: &Clip<Self::Payload>);
    fn set_volume(&mut self, volume: f32);
    fn set_looped(&mut self, looped: bool);

    /// Starts (or restarts) playback of the current clip.
    fn play(&mut self);
    /// Stops playback. After this call [`AudioChannel::is_playing`] must return `false`.
    fn stop(&mut self);
    fn is_playing(&self) -> bool;

    /// Toggles the channel between active and parked. Used to model pooled reuse.
    fn set_active(&mut self, active: bool);
}

pub trait AudioEngine: 'static {
    type Payload: ClipPayload;
    type Channel: AudioChannel<Payload = Self::Payload>;

    /// Creates a new channel.
    ///
    /// Channel creation is assumed to always succeed. If the engine can't create one, it should panic.
    fn create_channel(&mut self, category: ChannelCategory, label: &str) -> Self::Channel;
}

pub trait AssetLoader<P>: 'static {
    /// Loads the asset at the given logical path.
    ///
    /// Should return [`LoadError::NotFound`] if there is no such asset.
    fn load(&mut self, path: &str) -> Result<P, LoadError>;

    /// Releases the payload previously returned by [`AssetLoader::load`].
    fn unload(&mut self, path: &str, payload: &P);
}
