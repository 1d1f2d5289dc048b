//! Flat JSON state files. A missing or corrupt file yields defaults.

use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO: {0}")] Io(#[from] std::io::Error),
    #[error("JSON: {0}")] Json(#[from] serde_json::Error),
}

pub async fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Corrupt state file {}: {} (using defaults)", path.display(), e);
                T::default()
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => T::default(),
        Err(e) => {
            log::error!("Cannot read {}: {} (using defaults)", path.display(), e);
            T::default()
        }
    }
}

pub async fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

/// A state value with its backing file. Every update is written through.
#[derive(Debug)]
pub struct Stored<T> {
    path: PathBuf,
    value: Mutex<T>,
}

impl<T> Stored<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let value = load_or_default(&path).await;
        Self { path, value: Mutex::new(value) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self) -> T {
        self.value.lock().await.clone()
    }

    /// Applies `f` and persists the result. The in-memory value keeps the
    /// change even when the write fails.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StateError> {
        let mut guard = self.value.lock().await;
        let out = f(&mut guard);
        save(&self.path, &*guard).await?;
        Ok(out)
    }
}
