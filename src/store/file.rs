//! FileStore: the persisted mapping as a single JSON file.
//!
//! The file holds one JSON object, `{"<id>": "<plain text>", ...}`. Every
//! operation reads the whole file, edits the map and writes the whole file
//! back while holding the store lock, so there is no cached copy that could
//! drift from what is on disk. Cost is O(total secrets) per call.
//!
//! Writes land in `<path>.tmp`, are fsynced, then renamed over the data file.
//!
//! The in-process mutex only orders tasks of one server. Other processes
//! opening the same file (the `secret` CLI commands) are excluded by an
//! exclusive advisory lock on `<path>.lock`, held for the same critical
//! section. The lock lives on a sidecar file because the data file itself is
//! replaced on every write.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs4::fs_std::FileExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{Digest, SecretStore, StoreError};

type SecretsMap = BTreeMap<String, String>;

const EMPTY_MAPPING: &[u8] = b"{}";

pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    digest: Digest,
    /// Held across read, edit and write of the file.
    lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, creating it as an empty mapping if absent.
    pub async fn open(path: impl Into<PathBuf>, digest: Digest) -> Result<Self, StoreError> {
        let path = path.into();
        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::write(&path, EMPTY_MAPPING).await?;
                tracing::info!(path = %path.display(), "created empty secrets file");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            lock_path: sidecar_path(&path, ".lock"),
            path,
            digest,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Take the cross-process lock. Released when the returned file drops.
    async fn lock_file(&self) -> Result<std::fs::File, StoreError> {
        let lock_path = self.lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> io::Result<std::fs::File> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(io::Error::other)??;
        Ok(file)
    }

    async fn read_map(&self) -> Result<SecretsMap, StoreError> {
        let content = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&content)?)
    }

    async fn write_map(&self, map: &SecretsMap) -> Result<(), StoreError> {
        let content = serde_json::to_vec(map)?;

        let tmp_path = sidecar_path(&self.path, ".tmp");
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FileStore {
    async fn save(&self, plain_text: &str) -> Result<String, StoreError> {
        if plain_text.is_empty() {
            return Err(StoreError::InvalidInput("plain text is empty"));
        }
        let id = self.digest.id_for(plain_text);

        let _guard = self.lock.lock().await;
        let _file_lock = self.lock_file().await?;
        let mut secrets = self.read_map().await?;
        secrets.insert(id.clone(), plain_text.to_string());
        self.write_map(&secrets).await?;

        tracing::debug!(entries = secrets.len(), "secret saved");
        Ok(id)
    }

    async fn consume(&self, id: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        let _file_lock = self.lock_file().await?;
        let mut secrets = self.read_map().await?;

        let Some(value) = secrets.remove(id) else {
            return Ok(None);
        };
        // Only hand the value out once its removal is on disk.
        self.write_map(&secrets).await?;

        tracing::debug!(entries = secrets.len(), "secret consumed");
        Ok(Some(value))
    }
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
