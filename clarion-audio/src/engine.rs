use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clarion_core::{AudioChannel, AudioEngine, ChannelCategory, Clip, ClipPayload};
use kira::{
    Volume,
    manager::{
        AudioManager, AudioManagerSettings,
        backend::{Backend, DefaultBackend},
    },
    sound::{
        PlaybackState,
        static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
    },
    track::{TrackBuilder, TrackHandle, TrackId},
    tween::Tween,
};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::KiraSettings;

/// Decoded audio, kept in memory.
#[derive(Clone)]
pub struct KiraClip {
    data: StaticSoundData,
}

impl KiraClip {
    pub fn new(data: StaticSoundData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &StaticSoundData {
        &self.data
    }
}

impl ClipPayload for KiraClip {
    fn duration(&self) -> Duration {
        self.data.duration()
    }
}

/// Owns the kira audio manager.
///
/// There is one track per category. Channels don't get tracks of their own: each sound is played
/// straight into its category's track with the channel's volume, so the number of channels is only
/// bounded by memory. The number of sounds playing at once is still bounded by kira's sound
/// capacity; past it [`KiraChannel::play`] fails and the channel reports itself as stopped.
pub struct KiraEngine<B: Backend = DefaultBackend> {
    manager: Arc<Mutex<AudioManager<B>>>,
    bgm_track: TrackHandle,
    voice_track: TrackHandle,
    sound_track: TrackHandle,
    stop_tween: Tween,
}

impl KiraEngine {
    pub fn new(settings: &KiraSettings) -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .context("Failed to create kira audio manager")?;

        Self::with_manager(manager, settings)
    }
}

impl<B: Backend> KiraEngine<B> {
    pub fn with_manager(mut manager: AudioManager<B>, settings: &KiraSettings) -> Result<Self> {
        let bgm_track = manager
            .add_sub_track(TrackBuilder::new())
            .context("Failed to create bgm track")?;
        let voice_track = manager
            .add_sub_track(TrackBuilder::new())
            .context("Failed to create voice track")?;
        let sound_track = manager
            .add_sub_track(TrackBuilder::new())
            .context("Failed to create sound track")?;

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
            bgm_track,
            voice_track,
            sound_track,
            stop_tween: Tween {
                duration: Duration::from_millis(settings.stop_fade_ms),
                ..Default::default()
            },
        })
    }

    fn category_track(&self, category: ChannelCategory) -> TrackId {
        match category {
            ChannelCategory::Bgm => self.bgm_track.id(),
            ChannelCategory::Voice => self.voice_track.id(),
            ChannelCategory::Sound => self.sound_track.id(),
        }
    }
}

impl<B: Backend + 'static> AudioEngine for KiraEngine<B> {
    type Payload = KiraClip;
    type Channel = KiraChannel<B>;

    fn create_channel(&mut self, category: ChannelCategory, label: &str) -> KiraChannel<B> {
        debug!("Creating kira channel {} ({:?})", label, category);

        KiraChannel {
            label: label.to_string(),
            manager: self.manager.clone(),
            track: self.category_track(category),
            data: None,
            volume: 1.0,
            looped: false,
            handle: None,
            stop_tween: self.stop_tween,
        }
    }
}

/// A channel playing into its category's track.
///
/// The channel holds on to its clip from [`AudioChannel::set_clip`] until it is stopped or parked.
/// A clip that ended on its own stays referenced until the channel gets a new one.
pub struct KiraChannel<B: Backend = DefaultBackend> {
    label: String,
    manager: Arc<Mutex<AudioManager<B>>>,
    track: TrackId,
    data: Option<StaticSoundData>,
    volume: f32,
    looped: bool,
    handle: Option<StaticSoundHandle>,
    stop_tween: Tween,
}

impl<B: Backend> KiraChannel<B> {
    /// The clip with this channel's playback settings applied.
    fn sound_data(&self) -> Option<StaticSoundData> {
        let data = self.data.clone()?;

        let mut settings = StaticSoundSettings::new()
            .volume(Volume::Amplitude(self.volume as f64))
            .output_destination(self.track);
        if self.looped {
            settings = settings.loop_region(..);
        }

        Some(data.with_settings(settings))
    }

    fn stop_sound(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            trace!("Stopping sound on channel {}", self.label);
            // the fade-out continues after the handle is dropped
            handle.stop(self.stop_tween);
        }
    }
}

impl<B: Backend + 'static> AudioChannel for KiraChannel<B> {
    type Payload = KiraClip;

    fn set_clip(&mut self, clip: &Clip<KiraClip>) {
        self.data = Some(clip.payload().data.clone());
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    fn play(&mut self) {
        // restarting a channel replaces the sound that was playing on it
        self.stop_sound();

        let Some(data) = self.sound_data() else {
            warn!("Tried to play channel {}, but it has no clip", self.label);
            return;
        };

        match self.manager.lock().play(data) {
            Ok(handle) => self.handle = Some(handle),
            // the session will see the channel as stopped and complete
            Err(err) => warn!("Failed to start playing on channel {}: {}", self.label, err),
        }
    }

    fn stop(&mut self) {
        self.stop_sound();
        self.data = None;
    }

    fn is_playing(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| handle.state() == PlaybackState::Playing)
    }

    fn set_active(&mut self, active: bool) {
        trace!("Channel {} active: {}", self.label, active);
        if !active {
            // parked channels don't keep their clip alive
            self.data = None;
        }
    }
}
