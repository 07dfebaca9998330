mod cli;
mod config;
mod locate;
mod player;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use clarion_audio::{FileAssetLoader, KiraEngine};
use clarion_core::{AudioManager, ClipCache};
use clarion_tasks::Scheduler;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Cli, Command},
    config::Config,
    locate::locate_assets,
    player::PlayPlan,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let assets_dir = locate_assets(cli.assets_dir.as_deref(), &config.audio.clip_prefix)?;
    let loader = FileAssetLoader::new(&assets_dir)?;

    match cli.command {
        Command::Play {
            bgm,
            no_loop_bgm,
            voice,
            sounds,
            volume,
            max_seconds,
        } => {
            let engine = KiraEngine::new(&config.kira)?;
            let scheduler = Scheduler::new();
            let manager = AudioManager::new(engine, loader, &config.audio, scheduler.clone());

            let plan = PlayPlan {
                bgm,
                loop_bgm: !no_loop_bgm,
                voice,
                sounds,
                volume,
            };
            player::start(&manager, &plan)?;

            let time_limit = max_seconds
                .map(Duration::try_from_secs_f32)
                .transpose()
                .context("Invalid --max-seconds")?;
            let ticks =
                player::run_until_idle(&scheduler, config.audio.tick_rate, time_limit, || {
                    manager.stop_all()
                });
            info!("Finished after {} ticks", ticks);

            manager.unload_all();
        }
        Command::Duration { names } => {
            let mut loader = loader;
            let mut cache = ClipCache::new(config.audio.clip_prefix.clone());

            for name in names {
                let duration = cache
                    .duration_of(&mut loader, &name)
                    .with_context(|| format!("Getting duration of {:?}", name))?;
                println!("{}\t{:.3}", name, duration.as_secs_f64());
            }
        }
    }

    Ok(())
}
