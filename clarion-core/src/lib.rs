//! This crate implements the core functionality of clarion
//!
//! This includes the channel registry, the sound channel pool, the clip cache and the playback
//! sessions tying them together. The audio engine and the asset loader are provided by the user
//! through the traits in [`backend`].

#![allow(clippy::uninlined_format_args)]

pub mod backend;
pub mod channel;
pub mod clip;
pub mod error;
pub mod manager;
pub mod pool;
pub mod session;
pub mod settings;

#[cfg(test)]
mod test_util;

pub use backend::{AssetLoader, AudioChannel, AudioEngine, ClipPayload};
pub use channel::{ChannelCategory, ChannelId, ChannelInfo};
pub use clip::{Clip, ClipCache};
pub use error::{AudioError, LoadError};
pub use manager::AudioManager;
pub use session::{Callback, PlayRequest, SessionState};
pub use settings::AudioSettings;
