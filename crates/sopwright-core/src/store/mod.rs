//! Artifact storage
//!
//! Rendered documents live in one flat directory. The random id prefix is the
//! only collision guard; there is no manifest and no lookup.

use std::path::{Component, Path, PathBuf};

use rand::Rng;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SopError};

/// URL-safe alphabet for generated ids
const ID_ALPHABET: &[u8] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ID_LEN: usize = 21;

/// Fresh random short identifier (21 URL-safe characters)
pub fn random_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Flat directory of rendered artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under `<random-id>_<desired_name>` and return the stored
    /// filename (not the full path)
    pub async fn save(&self, bytes: &[u8], desired_name: &str) -> Result<String> {
        if !is_plain_filename(desired_name) {
            return Err(SopError::InvalidFilename(desired_name.to_string()));
        }

        let filename = format!("{}_{}", random_id(), desired_name);

        // Idempotent; concurrent callers racing here is fine
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(&filename);
        fs::write(&path, bytes).await?;

        info!(filename = %filename, bytes = bytes.len(), "Artifact stored");
        Ok(filename)
    }

    /// Map a previously returned filename back to its path
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if !is_plain_filename(filename) {
            debug!(filename = %filename, "Rejected artifact lookup");
            return Err(SopError::InvalidFilename(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }
}

/// Exactly one normal path component: no separators, no `..`, not absolute
fn is_plain_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
