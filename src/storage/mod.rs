use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;

use crate::config::StorageOptions;

pub mod posts;
mod seed;

pub use posts::{LoadOutcome, NewPost, PostRecord, PostStore, StoreError};

pub const POSTS_KEY: &str = "vividPosts";
pub const THEME_KEY: &str = "vividDarkMode";
pub const CORRUPT_SUFFIX: &str = "corrupt";

const BLOB_TMP_EXTENSION: &str = "tmp";

pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating blob directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            bail!("invalid blob key '{key}'");
        }
        Ok(self.root.join(key))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.blob_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading blob {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let final_path = self.blob_path(key)?;
        let tmp_path = self.root.join(format!("{key}.{BLOB_TMP_EXTENSION}"));
        fs::write(&tmp_path, value)
            .with_context(|| format!("writing temporary blob {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("atomically persisting blob {}", final_path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing blob {}", path.display())),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.blobs.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.blobs.lock().remove(key);
        Ok(())
    }
}

#[derive(Clone)]
pub struct StorageHandle {
    blobs: Arc<dyn BlobStore>,
    options: Arc<StorageOptions>,
}

impl fmt::Debug for StorageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageHandle")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl StorageHandle {
    pub fn new(blobs: Arc<dyn BlobStore>, options: StorageOptions) -> Self {
        Self {
            blobs,
            options: Arc::new(options),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBlobStore::new()), StorageOptions::default())
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn read_blob(&self, key: &str) -> Result<Option<String>> {
        self.blobs.get(key)
    }

    pub fn write_blob(&self, key: &str, value: &str) -> Result<()> {
        self.blobs.set(key, value)
    }

    pub fn remove_blob(&self, key: &str) -> Result<()> {
        self.blobs.remove(key)
    }
}

pub fn init(storage: &StorageOptions) -> Result<StorageHandle> {
    let store = FileBlobStore::open(&storage.blob_dir)?;
    tracing::debug!(root = %store.root().display(), "opened blob store");
    Ok(StorageHandle::new(Arc::new(store), storage.clone()))
}

pub fn corrupt_backup_key(key: &str) -> String {
    format!("{key}.{CORRUPT_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_and_overwrites() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileBlobStore::open(temp.path().join("blobs"))?;
        assert_eq!(store.get(POSTS_KEY)?, None);

        store.set(POSTS_KEY, "[]")?;
        store.set(POSTS_KEY, "[1]")?;
        assert_eq!(store.get(POSTS_KEY)?.as_deref(), Some("[1]"));
        assert!(!store.root().join("vividPosts.tmp").exists());
        Ok(())
    }

    #[test]
    fn file_store_remove_tolerates_missing_keys() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileBlobStore::open(temp.path())?;
        store.remove(THEME_KEY)?;
        store.set(THEME_KEY, "enabled")?;
        store.remove(THEME_KEY)?;
        assert_eq!(store.get(THEME_KEY)?, None);
        Ok(())
    }

    #[test]
    fn file_store_rejects_path_like_keys() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileBlobStore::open(temp.path())?;
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
        assert!(store.get(".hidden").is_err());
        Ok(())
    }

    #[test]
    fn init_uses_configured_blob_dir() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let options = StorageOptions {
            blob_dir: temp.path().join("data/blobs"),
            ..StorageOptions::default()
        };
        let storage = init(&options)?;
        storage.write_blob(POSTS_KEY, "[]")?;
        assert!(temp.path().join("data/blobs/vividPosts").exists());
        assert_eq!(corrupt_backup_key(POSTS_KEY), "vividPosts.corrupt");
        Ok(())
    }
}
