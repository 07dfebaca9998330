use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clarion_core::{AssetLoader, AudioEngine, AudioManager, PlayRequest};
use clarion_tasks::Scheduler;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct PlayPlan {
    pub bgm: Option<String>,
    pub loop_bgm: bool,
    pub voice: Option<String>,
    pub sounds: Vec<String>,
    pub volume: f32,
}

fn logged_request(name: &str, volume: f32) -> PlayRequest {
    let (begin_name, end_name) = (name.to_string(), name.to_string());
    PlayRequest::new(name, volume)
        .on_begin(move || info!("Playing {}", begin_name))
        .on_end(move || info!("Finished {}", end_name))
}

/// Starts every playback in the plan.
pub fn start<E, L>(manager: &AudioManager<E, L>, plan: &PlayPlan) -> Result<()>
where
    E: AudioEngine,
    L: AssetLoader<E::Payload>,
{
    if let Some(bgm) = &plan.bgm {
        manager
            .play_bgm(logged_request(bgm, plan.volume).looped(plan.loop_bgm))
            .with_context(|| format!("Playing BGM {:?}", bgm))?;
    }
    if let Some(voice) = &plan.voice {
        manager
            .play_voice(logged_request(voice, plan.volume))
            .with_context(|| format!("Playing voice {:?}", voice))?;
    }
    for sound in &plan.sounds {
        manager
            .play_sound(logged_request(sound, plan.volume))
            .with_context(|| format!("Playing sound {:?}", sound))?;
    }

    Ok(())
}

/// Ticks the scheduler at `tick_rate` until every task is done.
///
/// Once `time_limit` passes, `on_time_limit` is called (it is expected to stop all channels) and the
/// loop gives the tasks one more tick to finish. Returns the number of ticks run.
pub fn run_until_idle(
    scheduler: &Scheduler,
    tick_rate: u32,
    time_limit: Option<Duration>,
    on_time_limit: impl FnOnce(),
) -> u64 {
    let period = Duration::from_secs_f64(1.0 / tick_rate.max(1) as f64);
    let start = Instant::now();
    let mut on_time_limit = Some(on_time_limit);
    let mut ticks = 0;

    loop {
        scheduler.tick();
        ticks += 1;

        if scheduler.is_idle() {
            break;
        }

        if on_time_limit.is_none() {
            warn!("Tasks still running after stopping everything, giving up");
            break;
        }

        if time_limit.is_some_and(|limit| start.elapsed() >= limit) {
            info!("Time limit reached, stopping");
            if let Some(on_time_limit) = on_time_limit.take() {
                on_time_limit();
            }
            continue;
        }

        std::thread::sleep(period);
    }

    ticks
}
