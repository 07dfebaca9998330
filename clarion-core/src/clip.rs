use std::{fmt, sync::Arc, time::Duration};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    backend::{AssetLoader, ClipPayload},
    error::AudioError,
    settings::clip_path,
};

/// A loaded audio asset, identified by its logical name.
pub struct Clip<P> {
    name: String,
    path: String,
    duration: Duration,
    payload: P,
}

impl<P: ClipPayload> Clip<P> {
    pub fn new(name: impl Into<String>, path: impl Into<String>, payload: P) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            duration: payload.duration(),
            payload,
        }
    }
}

impl<P> Clip<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path the clip was loaded from.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}

impl<P> fmt::Debug for Clip<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// Keeps every clip loaded so far, keyed by name.
///
/// Clips are never evicted implicitly: they stay cached until [`ClipCache::unload_all`] is called.
pub struct ClipCache<P> {
    prefix: String,
    clips: IndexMap<String, Arc<Clip<P>>>,
}

impl<P: ClipPayload> ClipCache<P> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            clips: IndexMap::new(),
        }
    }

    /// Returns the cached clip, loading it first if it's not cached yet.
    pub fn resolve<L: AssetLoader<P>>(
        &mut self,
        loader: &mut L,
        name: &str,
    ) -> Result<Arc<Clip<P>>, AudioError> {
        if let Some(clip) = self.clips.get(name) {
            debug!("Loaded clip from cache: {}", name);
            return Ok(clip.clone());
        }

        let path = clip_path(&self.prefix, name);
        debug!("Loading clip {} from {}", name, path);

        let payload = loader
            .load(&path)
            .map_err(|e| AudioError::from_load_error(name, e))?;
        let clip = Arc::new(Clip::new(name, path, payload));

        self.clips.insert(name.to_string(), clip.clone());

        Ok(clip)
    }

    /// Returns the duration of the clip, loading it first if it's not cached yet.
    pub fn duration_of<L: AssetLoader<P>>(
        &mut self,
        loader: &mut L,
        name: &str,
    ) -> Result<Duration, AudioError> {
        self.resolve(loader, name).map(|clip| clip.duration())
    }

    /// Asks the loader to release every cached clip and empties the cache.
    ///
    /// Channels still holding one of the clips are not touched, it's up to the caller to not unload
    /// clips that are still in use.
    pub fn unload_all<L: AssetLoader<P>>(&mut self, loader: &mut L) {
        for (name, clip) in self.clips.drain(..) {
            debug!("Unloading clip {} ({})", name, clip.path());
            loader.unload(clip.path(), clip.payload());
        }
    }
}

impl<P> ClipCache<P> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
