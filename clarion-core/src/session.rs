use std::fmt;

use tracing::trace;

use crate::channel::{ChannelCategory, ChannelId};

pub type Callback = Box<dyn FnOnce() + 'static>;

/// Parameters of a single playback.
pub struct PlayRequest {
    pub(crate) name: String,
    pub(crate) volume: f32,
    pub(crate) looped: Option<bool>,
    pub(crate) on_begin: Option<Callback>,
    pub(crate) on_end: Option<Callback>,
}

impl PlayRequest {
    /// The volume is expected to be in `0.0..=1.0`, but it's passed to the engine as-is.
    pub fn new(name: impl Into<String>, volume: f32) -> Self {
        Self {
            name: name.into(),
            volume,
            looped: None,
            on_begin: None,
            on_end: None,
        }
    }

    /// Overrides the looping behavior. By default only BGM loops.
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = Some(looped);
        self
    }

    /// Called right before the clip starts playing.
    pub fn on_begin(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_begin = Some(Box::new(f));
        self
    }

    /// Called once the channel stops playing, either because the clip ended or because the channel
    /// was stopped.
    pub fn on_end(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn resolve_looped(&self, category: ChannelCategory) -> bool {
        self.looped.unwrap_or(category.loops_by_default())
    }
}

impl fmt::Debug for PlayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayRequest")
            .field("name", &self.name)
            .field("volume", &self.volume)
            .field("looped", &self.looped)
            .field("on_begin", &self.on_begin.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    Requested,
    ClipResolved,
    Playing,
    Completed,
}

/// Tracks the progress of one playback through its states.
#[derive(Debug)]
pub(crate) struct Session {
    clip: String,
    channel: Option<ChannelId>,
    state: SessionState,
}

impl Session {
    pub fn new(clip: &str) -> Self {
        trace!("Session for {:?}: {:?}", clip, SessionState::Requested);
        Self {
            clip: clip.to_string(),
            channel: None,
            state: SessionState::Requested,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn bind(&mut self, channel: ChannelId) {
        self.channel = Some(channel);
    }

    pub fn advance(&mut self, next: SessionState) {
        debug_assert!(
            next > self.state,
            "session can only move forward ({:?} -> {:?})",
            self.state,
            next
        );
        trace!(
            "Session for {:?} on {}: {:?} -> {:?}",
            self.clip,
            self.channel
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.state,
            next
        );
        self.state = next;
    }
}
