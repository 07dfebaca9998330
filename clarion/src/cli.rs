use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(version, about)]
pub struct Cli {
    /// Directory containing the clip folder. Located automatically when not given.
    #[clap(short, long, global = true)]
    pub assets_dir: Option<PathBuf>,
    /// YAML configuration file.
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Play clips and wait until they finish.
    Play {
        #[clap(long)]
        bgm: Option<String>,
        /// Play the BGM once instead of looping it.
        #[clap(long)]
        no_loop_bgm: bool,
        #[clap(long)]
        voice: Option<String>,
        /// Sound effect to play, can be given multiple times.
        #[clap(long = "sound")]
        sounds: Vec<String>,
        #[clap(short, long, default_value = "1.0")]
        volume: f32,
        /// Stop everything after this many seconds.
        #[clap(long)]
        max_seconds: Option<f32>,
    },
    /// Print clip durations in seconds.
    Duration { names: Vec<String> },
}
