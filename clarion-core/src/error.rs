use thiserror::Error;

/// Errors produced by an [`AssetLoader`](crate::AssetLoader).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Asset {path:?} not found")]
    NotFound { path: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio clip {name:?} not found (looked up at {path:?})")]
    ClipNotFound { name: String, path: String },
    #[error("Failed to load audio clip {name:?}")]
    Load {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AudioError {
    pub(crate) fn from_load_error(name: &str, error: LoadError) -> Self {
        match error {
            LoadError::NotFound { path } => AudioError::ClipNotFound {
                name: name.to_string(),
                path,
            },
            LoadError::Other(source) => AudioError::Load {
                name: name.to_string(),
                source,
            },
        }
    }
}
