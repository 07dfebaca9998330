use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clarion_core::{AssetLoader, LoadError};
use kira::sound::static_sound::StaticSoundData;
use tracing::debug;

use crate::engine::KiraClip;

/// Extensions tried, in order, when the logical path has no extension.
const EXTENSIONS: &[&str] = &["ogg", "wav", "mp3", "flac"];

/// Loads clips from a directory on disk.
#[derive(Debug)]
pub struct FileAssetLoader {
    root_path: PathBuf,
}

impl FileAssetLoader {
    pub fn new(root_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root_path = root_path.as_ref();
        let meta = std::fs::metadata(root_path).with_context(|| {
            format!(
                "Failed to get metadata for {:?}, cannot use as asset directory",
                root_path
            )
        })?;
        if !meta.is_dir() {
            bail!(
                "{:?} is not a directory, cannot use as asset directory",
                root_path
            );
        }

        Ok(Self {
            root_path: root_path.to_path_buf(),
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn find(&self, path: &str) -> Option<PathBuf> {
        let base = self.root_path.join(path.trim_start_matches('/'));
        if base.is_file() {
            return Some(base);
        }

        EXTENSIONS
            .iter()
            .map(|ext| self.root_path.join(format!("{}.{}", path.trim_start_matches('/'), ext)))
            .find(|candidate| candidate.is_file())
    }
}

impl AssetLoader<KiraClip> for FileAssetLoader {
    fn load(&mut self, path: &str) -> Result<KiraClip, LoadError> {
        let Some(full_path) = self.find(path) else {
            return Err(LoadError::NotFound {
                path: path.to_string(),
            });
        };

        debug!("Decoding {:?}", full_path);
        let data = StaticSoundData::from_file(&full_path)
            .with_context(|| format!("Decoding audio file {:?}", full_path))?;

        Ok(KiraClip::new(data))
    }

    /// Decoded samples are reference counted. They are freed once the cache, every channel holding
    /// the clip and every kira sound playing it have let go of them.
    fn unload(&mut self, path: &str, _payload: &KiraClip) {
        debug!("Unloading {}", path);
    }
}
