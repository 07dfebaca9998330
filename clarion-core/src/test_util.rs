//! In-memory collaborators for tests.

use std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration};

use anyhow::anyhow;

use crate::{
    backend::{AssetLoader, AudioChannel, AudioEngine, ClipPayload},
    channel::ChannelCategory,
    clip::Clip,
    error::LoadError,
};

#[derive(Debug, Clone)]
pub struct MockPayload {
    duration: Duration,
}

impl ClipPayload for MockPayload {
    fn duration(&self) -> Duration {
        self.duration
    }
}

#[derive(Debug, Default)]
pub struct LoaderLog {
    pub loads: Vec<String>,
    pub unloads: Vec<String>,
}

pub struct MockLoader {
    clips: HashMap<String, Duration>,
    broken: Vec<String>,
    log: Rc<RefCell<LoaderLog>>,
}

impl MockLoader {
    /// Creates a loader knowing the given clips (name, duration in seconds), all under `Audios/`.
    pub fn new(clips: &[(&str, f32)]) -> Self {
        Self {
            clips: clips
                .iter()
                .map(|&(name, secs)| (format!("Audios/{}", name), Duration::from_secs_f32(secs)))
                .collect(),
            broken: Vec::new(),
            log: Rc::new(RefCell::new(LoaderLog::default())),
        }
    }

    pub fn with_broken(mut self, name: &str) -> Self {
        self.broken.push(format!("Audios/{}", name));
        self
    }

    pub fn log(&self) -> Rc<RefCell<LoaderLog>> {
        self.log.clone()
    }
}

impl AssetLoader<MockPayload> for MockLoader {
    fn load(&mut self, path: &str) -> Result<MockPayload, LoadError> {
        self.log.borrow_mut().loads.push(path.to_string());

        if self.broken.iter().any(|b| b == path) {
            return Err(anyhow!("corrupted data in {}", path).into());
        }

        match self.clips.get(path) {
            Some(&duration) => Ok(MockPayload { duration }),
            None => Err(LoadError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    fn unload(&mut self, path: &str, _payload: &MockPayload) {
        self.log.borrow_mut().unloads.push(path.to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockChannelState {
    pub clip: Option<String>,
    pub volume: f32,
    pub looped: bool,
    pub playing: bool,
    pub active: bool,
    pub play_count: usize,
    pub stop_count: usize,
}

pub struct MockChannel {
    state: Rc<RefCell<MockChannelState>>,
}

impl AudioChannel for MockChannel {
    type Payload = MockPayload;

    fn set_clip(&mut self, clip: &Clip<MockPayload>) {
        self.state.borrow_mut().clip = Some(clip.name().to_string());
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_looped(&mut self, looped: bool) {
        self.state.borrow_mut().looped = looped;
    }

    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = true;
        state.play_count += 1;
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.stop_count += 1;
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    fn set_active(&mut self, active: bool) {
        self.state.borrow_mut().active = active;
    }
}

type ChannelMap = Rc<RefCell<Vec<(String, ChannelCategory, Rc<RefCell<MockChannelState>>)>>>;

/// An engine whose channels never finish on their own: tests end playback with [`MockEngine::finish`].
#[derive(Clone, Default)]
pub struct MockEngine {
    channels: ChannelMap,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, label: &str) -> Rc<RefCell<MockChannelState>> {
        self.channels
            .borrow()
            .iter()
            .find(|(l, _, _)| l == label)
            .map(|(_, _, state)| state.clone())
            .unwrap_or_else(|| panic!("no channel labelled {:?}", label))
    }

    pub fn state(&self, label: &str) -> MockChannelState {
        self.find(label).borrow().clone()
    }

    /// Simulates the clip reaching its natural end.
    pub fn finish(&self, label: &str) {
        self.find(label).borrow_mut().playing = false;
    }

    pub fn created(&self, category: ChannelCategory) -> usize {
        self.channels
            .borrow()
            .iter()
            .filter(|(_, c, _)| *c == category)
            .count()
    }
}

impl AudioEngine for MockEngine {
    type Payload = MockPayload;
    type Channel = MockChannel;

    fn create_channel(&mut self, category: ChannelCategory, label: &str) -> MockChannel {
        let state = Rc::new(RefCell::new(MockChannelState {
            volume: 1.0,
            active: true,
            ..Default::default()
        }));
        self.channels
            .borrow_mut()
            .push((label.to_string(), category, state.clone()));
        MockChannel { state }
    }
}
