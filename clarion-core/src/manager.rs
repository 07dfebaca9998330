use std::{cell::RefCell, rc::Rc, sync::Arc, time::Duration};

use clarion_tasks::Scheduler;
use tracing::{debug, warn};

use crate::{
    backend::{AssetLoader, AudioEngine},
    channel::{Channel, ChannelCategory, ChannelId, ChannelInfo},
    clip::{Clip, ClipCache},
    error::AudioError,
    pool::SoundPool,
    session::{PlayRequest, Session, SessionState},
    settings::AudioSettings,
};

struct Inner<E: AudioEngine, L> {
    engine: E,
    loader: L,
    cache: ClipCache<E::Payload>,
    bgm: Channel<E::Channel>,
    voice: Channel<E::Channel>,
    pool: SoundPool<E::Channel>,
}

impl<E: AudioEngine, L> Inner<E, L> {
    fn channel(&self, id: ChannelId) -> Option<&Channel<E::Channel>> {
        match id {
            ChannelId::Bgm => Some(&self.bgm),
            ChannelId::Voice => Some(&self.voice),
            ChannelId::Sound(index) => self.pool.get(index),
        }
    }

    fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel<E::Channel>> {
        match id {
            ChannelId::Bgm => Some(&mut self.bgm),
            ChannelId::Voice => Some(&mut self.voice),
            ChannelId::Sound(index) => self.pool.get_mut(index),
        }
    }

    fn is_playing(&self, id: ChannelId) -> bool {
        self.channel(id).is_some_and(|c| c.is_playing())
    }
}

/// Plays clips on one BGM channel, one voice channel and a pool of sound channels.
///
/// This is a cheap handle: clones refer to the same channels and cache. Playback completion is
/// detected by sessions running on the [`Scheduler`] passed at construction, so the owner must keep
/// calling [`Scheduler::tick`] for callbacks to fire and sound channels to be recycled.
pub struct AudioManager<E: AudioEngine, L: AssetLoader<E::Payload>> {
    inner: Rc<RefCell<Inner<E, L>>>,
    scheduler: Scheduler,
}

impl<E: AudioEngine, L: AssetLoader<E::Payload>> Clone for AudioManager<E, L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<E: AudioEngine, L: AssetLoader<E::Payload>> AudioManager<E, L> {
    pub fn new(mut engine: E, loader: L, settings: &AudioSettings, scheduler: Scheduler) -> Self {
        let bgm = Channel::new(
            ChannelId::Bgm,
            engine.create_channel(ChannelCategory::Bgm, &ChannelId::Bgm.to_string()),
        );
        let voice = Channel::new(
            ChannelId::Voice,
            engine.create_channel(ChannelCategory::Voice, &ChannelId::Voice.to_string()),
        );

        let mut pool = SoundPool::new();
        pool.prewarm(&mut engine, settings.initial_sound_channels);

        debug!(
            "Created audio manager (clip prefix {:?}, {} sound channels pre-created)",
            settings.clip_prefix, settings.initial_sound_channels
        );

        Self {
            inner: Rc::new(RefCell::new(Inner {
                engine,
                loader,
                cache: ClipCache::new(settings.clip_prefix.clone()),
                bgm,
                voice,
                pool,
            })),
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Plays background music. Replaces whatever is playing on the BGM channel.
    pub fn play_bgm(&self, request: PlayRequest) -> Result<ChannelId, AudioError> {
        self.play(ChannelCategory::Bgm, request)
    }

    /// Plays a voice line. Replaces whatever is playing on the voice channel.
    pub fn play_voice(&self, request: PlayRequest) -> Result<ChannelId, AudioError> {
        self.play(ChannelCategory::Voice, request)
    }

    /// Plays a sound effect on a channel borrowed from the pool. Any number of sounds can play at once.
    pub fn play_sound(&self, request: PlayRequest) -> Result<ChannelId, AudioError> {
        self.play(ChannelCategory::Sound, request)
    }

    /// Starts a playback session.
    ///
    /// Everything up to the start of playback happens before this function returns: the clip is
    /// resolved (errors are returned here), the channel is picked, the begin callback runs and the
    /// channel starts playing. Waiting for the end of playback happens on the scheduler.
    pub fn play(
        &self,
        category: ChannelCategory,
        request: PlayRequest,
    ) -> Result<ChannelId, AudioError> {
        let looped = request.resolve_looped(category);
        let PlayRequest {
            name,
            volume,
            on_begin,
            on_end,
            ..
        } = request;

        let mut session = Session::new(&name);

        let (id, clip) = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;

            let clip = inner.cache.resolve(&mut inner.loader, &name)?;
            let id = match category {
                ChannelCategory::Bgm => ChannelId::Bgm,
                ChannelCategory::Voice => ChannelId::Voice,
                ChannelCategory::Sound => inner.pool.acquire(&mut inner.engine),
            };
            (id, clip)
        };
        session.bind(id);
        session.advance(SessionState::ClipResolved);

        // no borrows are held while calling back into user code
        if let Some(on_begin) = on_begin {
            on_begin();
        }

        self.start_channel(id, clip, volume, looped);
        session.advance(SessionState::Playing);

        let inner = self.inner.clone();
        let ticks = self.scheduler.handle();
        self.scheduler
            .spawn(async move {
                ticks.wait_until(|| !inner.borrow().is_playing(id)).await;
                debug_assert_eq!(session.state(), SessionState::Playing);

                if let ChannelId::Sound(index) = id {
                    inner.borrow_mut().pool.release(index);
                }
                session.advance(SessionState::Completed);

                if let Some(on_end) = on_end {
                    on_end();
                }
            })
            .detach();

        Ok(id)
    }

    fn start_channel(&self, id: ChannelId, clip: Arc<Clip<E::Payload>>, volume: f32, looped: bool) {
        let mut inner = self.inner.borrow_mut();
        let channel = inner
            .channel_mut(id)
            .expect("the channel of a running session always exists");

        channel.assign(clip, volume, looped);
        channel.play();
    }

    /// Stops a single channel. Its session will complete on the next tick.
    ///
    /// A [`ChannelId::Sound`] only refers to a session until that session completes. After that the
    /// slot goes back to the pool, and stopping it stops whatever sound reuses the slot later.
    pub fn stop(&self, id: ChannelId) {
        match self.inner.borrow_mut().channel_mut(id) {
            Some(channel) => channel.stop(),
            None => warn!("Tried to stop channel {}, but it doesn't exist", id),
        }
    }

    /// Stops BGM, voice and every sound channel in use.
    ///
    /// Sound channels are not returned to the pool here: each one is reclaimed by its own session
    /// once the session observes that the channel stopped.
    pub fn stop_all(&self) {
        let mut inner = self.inner.borrow_mut();
        debug!(
            "Stopping all channels ({} sound channels in use)",
            inner.pool.in_use_count()
        );

        inner.bgm.stop();
        inner.voice.stop();
        inner.pool.stop_in_use();
    }

    /// Returns the duration of the named clip, loading it if necessary.
    pub fn duration_of(&self, name: &str) -> Result<Duration, AudioError> {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        inner.cache.duration_of(&mut inner.loader, name)
    }

    /// Releases every cached clip.
    ///
    /// Channels still referencing an unloaded clip are not stopped; don't call this while
    /// something is still playing. Every channel keeps a reference to the last clip assigned to it
    /// until it gets a new one, so that clip's payload outlives the cache entry.
    pub fn unload_all(&self) {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        inner.cache.unload_all(&mut inner.loader);
    }

    pub fn bgm_channel(&self) -> ChannelInfo {
        self.inner.borrow().bgm.info()
    }

    pub fn voice_channel(&self) -> ChannelInfo {
        self.inner.borrow().voice.info()
    }

    pub fn channel_info(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.inner.borrow().channel(id).map(|c| c.info())
    }

    /// Sound channels currently lent out, in the order they were acquired.
    pub fn active_sound_channels(&self) -> Vec<ChannelId> {
        self.inner.borrow().pool.in_use().collect()
    }

    /// Sound channels parked in the free list, in the order they will be reused.
    pub fn free_sound_channels(&self) -> Vec<ChannelId> {
        self.inner.borrow().pool.free().collect()
    }

    /// Number of sound channels ever created.
    pub fn sound_channel_count(&self) -> usize {
        self.inner.borrow().pool.capacity()
    }

    pub fn cached_clip_count(&self) -> usize {
        self.inner.borrow().cache.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::test_util::{LoaderLog, MockEngine, MockLoader};

    type TestManager = AudioManager<MockEngine, MockLoader>;

    struct Fixture {
        manager: TestManager,
        engine: MockEngine,
        loader_log: Rc<RefCell<LoaderLog>>,
        scheduler: Scheduler,
    }

    fn fixture_with(settings: AudioSettings) -> Fixture {
        let engine = MockEngine::new();
        let loader = MockLoader::new(&[
            ("theme", 90.0),
            ("battle", 120.0),
            ("hello", 2.5),
            ("hit", 0.25),
            ("coin", 0.5),
        ]);
        let loader_log = loader.log();
        let scheduler = Scheduler::new();
        let manager = AudioManager::new(engine.clone(), loader, &settings, scheduler.clone());

        Fixture {
            manager,
            engine,
            loader_log,
            scheduler,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(AudioSettings::default())
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        (count, move || count_clone.set(count_clone.get() + 1))
    }

    #[test]
    fn bgm_is_overwritten() {
        let f = fixture();

        f.manager
            .play_bgm(PlayRequest::new("theme", 0.8).looped(true))
            .unwrap();
        f.manager
            .play_bgm(PlayRequest::new("battle", 0.5).looped(true))
            .unwrap();

        let info = f.manager.bgm_channel();
        assert_eq!(info.clip.as_deref(), Some("battle"));
        assert_eq!(info.volume, 0.5);
        assert!(info.looped);
        assert!(info.playing);

        let state = f.engine.state("bgm");
        assert_eq!(state.clip.as_deref(), Some("battle"));
        assert_eq!(state.play_count, 2);
        assert_eq!(f.engine.created(ChannelCategory::Bgm), 1);
    }

    #[test]
    fn overwritten_bgm_sessions_complete_together() {
        let f = fixture();
        let (theme_ended, on_theme_end) = counter();
        let (battle_ended, on_battle_end) = counter();

        f.manager
            .play_bgm(PlayRequest::new("theme", 0.8).on_end(on_theme_end))
            .unwrap();
        f.scheduler.tick();
        f.manager
            .play_bgm(PlayRequest::new("battle", 0.5).on_end(on_battle_end))
            .unwrap();
        f.scheduler.tick();

        // the first session doesn't notice the clip was swapped while the channel keeps playing
        assert_eq!(theme_ended.get(), 0);

        f.engine.finish("bgm");
        f.scheduler.tick();
        assert_eq!(theme_ended.get(), 1);
        assert_eq!(battle_ended.get(), 1);
        assert!(f.scheduler.is_idle());
    }

    #[test]
    fn category_loop_defaults() {
        let f = fixture();

        f.manager.play_bgm(PlayRequest::new("theme", 1.0)).unwrap();
        f.manager.play_voice(PlayRequest::new("hello", 1.0)).unwrap();
        let sound = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();

        assert!(f.manager.bgm_channel().looped);
        assert!(!f.manager.voice_channel().looped);
        assert!(!f.manager.channel_info(sound).unwrap().looped);
    }

    #[test]
    fn sound_channel_is_reused_after_completion() {
        let f = fixture();

        let first = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();
        assert_eq!(first, ChannelId::Sound(0));
        f.scheduler.tick();
        assert_eq!(f.manager.active_sound_channels(), vec![first]);

        f.engine.finish("sound-0");
        f.scheduler.tick();
        assert!(f.manager.active_sound_channels().is_empty());
        assert_eq!(f.manager.free_sound_channels(), vec![first]);
        assert!(!f.engine.state("sound-0").active);

        let second = f.manager.play_sound(PlayRequest::new("coin", 1.0)).unwrap();
        assert_eq!(second, first);
        assert_eq!(f.engine.created(ChannelCategory::Sound), 1);
        assert!(f.manager.free_sound_channels().is_empty());

        let state = f.engine.state("sound-0");
        assert!(state.active);
        assert!(state.playing);
        assert_eq!(state.clip.as_deref(), Some("coin"));
    }

    #[test]
    fn concurrent_sounds_get_separate_channels() {
        let f = fixture();

        let a = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();
        let b = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(f.manager.sound_channel_count(), 2);
        // the clip is shared
        assert_eq!(f.loader_log.borrow().loads, vec!["Audios/hit".to_string()]);

        f.scheduler.tick();
        f.engine.finish("sound-1");
        f.scheduler.tick();
        assert_eq!(f.manager.active_sound_channels(), vec![a]);
        assert_eq!(f.manager.free_sound_channels(), vec![b]);
    }

    #[test]
    fn stop_all_does_not_recycle_sounds() {
        let f = fixture();

        f.manager.play_bgm(PlayRequest::new("theme", 1.0)).unwrap();
        f.manager.play_voice(PlayRequest::new("hello", 1.0)).unwrap();
        let a = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();
        let b = f.manager.play_sound(PlayRequest::new("coin", 1.0)).unwrap();
        f.scheduler.tick();

        f.manager.stop_all();

        assert!(!f.manager.bgm_channel().playing);
        assert!(!f.manager.voice_channel().playing);
        assert!(!f.manager.channel_info(a).unwrap().playing);
        assert!(!f.manager.channel_info(b).unwrap().playing);

        // stopped, but still lent out
        assert_eq!(f.manager.active_sound_channels(), vec![a, b]);
        assert!(f.manager.free_sound_channels().is_empty());

        // their sessions take them back on the next tick
        f.scheduler.tick();
        assert!(f.manager.active_sound_channels().is_empty());
        assert_eq!(f.manager.free_sound_channels(), vec![a, b]);
        assert!(f.scheduler.is_idle());
    }

    #[test]
    fn stop_completes_session_on_next_tick() {
        let f = fixture();
        let (ended, on_end) = counter();

        let id = f
            .manager
            .play_sound(PlayRequest::new("hit", 1.0).looped(true).on_end(on_end))
            .unwrap();
        f.scheduler.tick();
        f.scheduler.tick();
        assert_eq!(ended.get(), 0);

        f.manager.stop(id);
        assert_eq!(ended.get(), 0);
        f.scheduler.tick();
        assert_eq!(ended.get(), 1);
        assert_eq!(f.manager.free_sound_channels(), vec![id]);
    }

    #[test]
    fn stop_leaves_other_channels_alone() {
        let f = fixture();

        f.manager.play_bgm(PlayRequest::new("theme", 1.0)).unwrap();
        let sound = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();

        f.manager.stop(ChannelId::Bgm);
        assert!(!f.manager.bgm_channel().playing);
        assert!(f.manager.channel_info(sound).unwrap().playing);

        // unknown sound channels are ignored
        f.manager.stop(ChannelId::Sound(42));
    }

    #[test]
    fn sound_id_refers_to_the_slot_not_the_session() {
        let f = fixture();

        let old = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();
        f.engine.finish("sound-0");
        f.scheduler.tick();

        let (ended, on_end) = counter();
        let new = f
            .manager
            .play_sound(PlayRequest::new("coin", 1.0).on_end(on_end))
            .unwrap();
        assert_eq!(new, old);

        // the id kept from the finished session now stops the new one
        f.manager.stop(old);
        assert!(!f.engine.state("sound-0").playing);
        f.scheduler.tick();
        assert_eq!(ended.get(), 1);
        assert_eq!(f.manager.free_sound_channels(), vec![old]);
    }

    #[test]
    fn callbacks_wrap_playback() {
        let f = fixture();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (begin_log, begin_engine) = (log.clone(), f.engine.clone());
        let end_log = log.clone();
        f.manager
            .play_voice(
                PlayRequest::new("hello", 1.0)
                    .on_begin(move || {
                        // called before the channel is touched
                        assert!(!begin_engine.state("voice").playing);
                        begin_log.borrow_mut().push("begin");
                    })
                    .on_end(move || end_log.borrow_mut().push("end")),
            )
            .unwrap();

        assert_eq!(*log.borrow(), vec!["begin"]);
        assert!(f.engine.state("voice").playing);

        f.scheduler.tick();
        assert_eq!(*log.borrow(), vec!["begin"]);

        f.engine.finish("voice");
        f.scheduler.tick();
        assert_eq!(*log.borrow(), vec!["begin", "end"]);
    }

    #[test]
    fn end_callback_can_play_again() {
        let f = fixture();

        let manager = f.manager.clone();
        f.manager
            .play_sound(PlayRequest::new("hit", 1.0).on_end(move || {
                manager.play_sound(PlayRequest::new("coin", 1.0)).unwrap();
            }))
            .unwrap();
        f.scheduler.tick();

        f.engine.finish("sound-0");
        f.scheduler.tick();

        // the channel is recycled before the end callback runs, so the follow-up reuses it
        assert_eq!(f.manager.active_sound_channels(), vec![ChannelId::Sound(0)]);
        assert_eq!(f.manager.sound_channel_count(), 1);
        assert_eq!(f.engine.state("sound-0").clip.as_deref(), Some("coin"));
        assert!(!f.scheduler.is_idle());
    }

    #[test]
    fn missing_clip_is_reported() {
        let f = fixture();
        let (begun, on_begin) = counter();

        let err = f
            .manager
            .play_sound(PlayRequest::new("missing", 1.0).on_begin(on_begin))
            .unwrap_err();
        assert!(matches!(err, AudioError::ClipNotFound { ref name, .. } if name == "missing"));

        assert_eq!(begun.get(), 0);
        assert_eq!(f.manager.sound_channel_count(), 0);
        assert!(f.scheduler.is_idle());

        assert!(matches!(
            f.manager.play_bgm(PlayRequest::new("missing", 1.0)),
            Err(AudioError::ClipNotFound { .. })
        ));
        assert_eq!(f.manager.bgm_channel().clip, None);
    }

    #[test]
    fn volume_is_passed_through() {
        let f = fixture();

        let id = f.manager.play_sound(PlayRequest::new("hit", 1.7)).unwrap();
        assert_eq!(f.engine.state("sound-0").volume, 1.7);
        assert_eq!(f.manager.channel_info(id).unwrap().volume, 1.7);

        f.manager.play_bgm(PlayRequest::new("theme", -0.5)).unwrap();
        assert_eq!(f.engine.state("bgm").volume, -0.5);
    }

    #[test]
    fn durations_and_unloading() {
        let f = fixture();

        assert_eq!(
            f.manager.duration_of("theme").unwrap(),
            Duration::from_secs_f32(90.0)
        );
        f.manager.play_bgm(PlayRequest::new("theme", 1.0)).unwrap();
        assert_eq!(f.loader_log.borrow().loads.len(), 1);
        assert_eq!(f.manager.cached_clip_count(), 1);

        assert!(matches!(
            f.manager.duration_of("missing"),
            Err(AudioError::ClipNotFound { .. })
        ));

        f.manager.unload_all();
        assert_eq!(f.manager.cached_clip_count(), 0);
        assert_eq!(f.loader_log.borrow().unloads, vec!["Audios/theme".to_string()]);
    }

    #[test]
    fn prewarmed_pool() {
        let f = fixture_with(AudioSettings {
            initial_sound_channels: 2,
            ..AudioSettings::default()
        });

        assert_eq!(f.engine.created(ChannelCategory::Sound), 2);
        assert_eq!(
            f.manager.free_sound_channels(),
            vec![ChannelId::Sound(0), ChannelId::Sound(1)]
        );

        let id = f.manager.play_sound(PlayRequest::new("hit", 1.0)).unwrap();
        assert_eq!(id, ChannelId::Sound(0));
        assert_eq!(f.manager.sound_channel_count(), 2);
    }

    #[test]
    fn custom_clip_prefix() {
        let engine = MockEngine::new();
        let loader = MockLoader::new(&[("theme", 1.0)]);
        let log = loader.log();
        let manager = AudioManager::new(
            engine,
            loader,
            &AudioSettings {
                clip_prefix: "Music".to_string(),
                ..AudioSettings::default()
            },
            Scheduler::new(),
        );

        assert!(manager.play_bgm(PlayRequest::new("theme", 1.0)).is_err());
        assert_eq!(log.borrow().loads, vec!["Music/theme".to_string()]);
    }
}
