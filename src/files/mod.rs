pub mod archive;

use std::path::{Component, Path, PathBuf};

use crate::config::FileConfig;

pub const PRIVATE: &str = "private://";
pub const PUBLIC: &str = "public://";
pub const TEMPORARY: &str = "temporary://";

/// Maps `scheme://path` URIs onto directories on disk.
#[derive(Debug, Clone)]
pub struct StreamWrappers {
    private: PathBuf,
    public: PathBuf,
    temporary: PathBuf,
}

impl StreamWrappers {
    pub fn new(private: PathBuf, public: PathBuf, temporary: PathBuf) -> Self {
        Self {
            private,
            public,
            temporary,
        }
    }

    pub fn from_config(files: &FileConfig) -> Self {
        Self::new(
            files.private_dir.clone(),
            files.public_dir.clone(),
            files.temp_dir.clone(),
        )
    }

    /// Filesystem path for a URI. `None` for unknown schemes and for paths
    /// that would climb out of their root.
    pub fn realpath(&self, uri: &str) -> Option<PathBuf> {
        let (root, rest) = if let Some(rest) = uri.strip_prefix(PRIVATE) {
            (&self.private, rest)
        } else if let Some(rest) = uri.strip_prefix(PUBLIC) {
            (&self.public, rest)
        } else if let Some(rest) = uri.strip_prefix(TEMPORARY) {
            (&self.temporary, rest)
        } else {
            return None;
        };

        let relative = Path::new(rest.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(root.join(relative))
    }
}

/// True for URIs under one of the persistent schemes.
pub fn is_persistent_uri(uri: &str) -> bool {
    uri.starts_with(PRIVATE) || uri.starts_with(PUBLIC)
}

/// Last path segment of a URI.
pub fn basename(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// A name usable as a single path segment: no separators, no parent refs.
pub fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

