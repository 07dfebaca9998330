use std::path::{Path, PathBuf};

use anyhow::bail;
use tracing::{debug, instrument, trace};

#[instrument]
fn try_assets_directory(path: &Path, clip_prefix: &str) -> Option<PathBuf> {
    debug!("Trying assets directory {:?}...", path);
    if !path.is_dir() {
        debug!("Cannot use {:?} as assets directory, not a directory", path);
        return None;
    }

    let clips = path.join(clip_prefix);
    if !clips.is_dir() {
        trace!("Cannot use {:?} as assets directory, no {:?} in it", path, clip_prefix);
        return None;
    }

    path.canonicalize().ok()
}

/// Implements the logic for locating the clips.
///
/// The assets directory is expected to contain the clip folder (`Audios` by default).
///
/// The candidate asset directories are (in order)
/// 1. The directory specified on the command line with the `--assets-dir` option
/// 2. The directory specified in the `CLARION_ASSETS` environment variable
/// 3. The directory "assets" next to the executable
/// 4. The directory "assets" in the current working directory
/// 5. The "clarion/assets" directory in the user's shared data directory (see [`dirs_next::data_dir`])
pub fn locate_assets(cli_assets: Option<&Path>, clip_prefix: &str) -> anyhow::Result<PathBuf> {
    let mut try_list = Vec::new();

    if let Some(cli_assets) = cli_assets {
        try_list.push(cli_assets.to_path_buf());
    }

    if let Some(env_assets) = std::env::var_os("CLARION_ASSETS") {
        try_list.push(PathBuf::from(env_assets));
    }

    if let Some(exe_assets) = std::env::current_exe()?.parent().map(|p| p.join("assets")) {
        try_list.push(exe_assets);
    }

    try_list.push(std::env::current_dir()?.join("assets"));

    if let Some(shared_assets) = dirs_next::data_dir().map(|p| p.join("clarion").join("assets")) {
        try_list.push(shared_assets);
    }

    for path in try_list.iter() {
        if let Some(result) = try_assets_directory(path, clip_prefix) {
            debug!("Using assets directory {:?}", result);
            return Ok(result);
        }
    }

    bail!("Failed to locate assets directory, tried: {:#?}", try_list);
}
