//! Key-value property store
//!
//! Every component reads and writes its state through `PropertyStore`, which
//! is injected rather than looked up globally. `MemoryStore` backs tests and
//! embedders that persist elsewhere; `FileStore` keeps a flat JSON object on
//! disk for the CLI.
//!
//! There is no cross-process locking. Two writers racing on the same file
//! store end with whichever rename landed last.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// String properties keyed by name.
pub trait PropertyStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Properties held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from key/value pairs.
    pub fn with_properties<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let state = pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PropertyStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Properties persisted as a JSON object file.
///
/// The file is read once at `open`; every mutation rewrites it atomically
/// (temp file + rename) with 0600 permissions since it holds tokens and the
/// client secret.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating it as `{}` if it doesn't exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::Store(format!("reading property file: {e}")))?;
            let properties: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Store(format!("parsing property file: {e}")))?;
            info!(path = %path.display(), properties = properties.len(), "loaded property store");
            properties
        } else {
            info!(path = %path.display(), "property file not found, starting empty");
            let properties = HashMap::new();
            write_atomic(&path, &properties)?;
            properties
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PropertyStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// The in-memory map only changes once the file write has succeeded.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.lock();
        let mut next = state.clone();
        next.insert(key.to_owned(), value.to_owned());
        write_atomic(&self.path, &next)?;
        *state = next;
        debug!(key, "set property");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.contains_key(key) {
            return Ok(());
        }
        let mut next = state.clone();
        next.remove(key);
        write_atomic(&self.path, &next)?;
        *state = next;
        debug!(key, "deleted property");
        Ok(())
    }
}

/// Write the property map to `path` via a sibling temp file and rename.
fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Store(format!("serializing properties: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        Some(_) => Path::new("."),
        None => return Err(Error::Store("property path has no parent directory".into())),
    };

    let tmp_path = dir.join(format!(".properties.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Store(format!("writing temp property file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::Store(format!("setting property file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Store(format!("renaming temp property file: {e}")))?;

    debug!(path = %path.display(), "persisted properties");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set_delete() {
        let store = MemoryStore::new();
        assert!(store.get("CLIENT_ID").is_none());

        store.set("CLIENT_ID", "app-PRD-1").unwrap();
        assert_eq!(store.get("CLIENT_ID").as_deref(), Some("app-PRD-1"));

        store.delete("CLIENT_ID").unwrap();
        assert!(store.get("CLIENT_ID").is_none());

        // absent key
        store.delete("CLIENT_ID").unwrap();
    }

    #[test]
    fn memory_store_seeded() {
        let store = MemoryStore::with_properties([("SCOPE", "api_scope"), ("CLIENT_ID", "id")]);
        assert_eq!(store.get("SCOPE").as_deref(), Some("api_scope"));
        assert_eq!(store.get("CLIENT_ID").as_deref(), Some("id"));
    }

    #[test]
    fn file_store_cold_start_creates_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.json");

        assert!(!path.exists());
        let store = FileStore::open(&path).unwrap();
        assert!(store.get("ACCESS_TOKEN").is_none());
        assert!(path.exists());

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.json");

        let store = FileStore::open(&path).unwrap();
        store.set("ACCESS_TOKEN", "v^1.1#i^1").unwrap();
        store.set("TOKEN_EXPIRES_AT", "1735500000000").unwrap();
        store.delete("TOKEN_EXPIRES_AT").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("ACCESS_TOKEN").as_deref(), Some("v^1.1#i^1"));
        assert!(reopened.get("TOKEN_EXPIRES_AT").is_none());
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).err().unwrap();
        assert!(matches!(err, Error::Store(_)), "got: {err:?}");
    }

    #[test]
    fn file_store_failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("store");
        std::fs::create_dir(&nested).unwrap();

        let store = FileStore::open(nested.join("properties.json")).unwrap();
        store.set("REFRESH_TOKEN", "R1").unwrap();
        std::fs::remove_dir_all(&nested).unwrap();

        let err = store.set("ACCESS_TOKEN", "A1").unwrap_err();
        assert!(matches!(err, Error::Store(_)), "got: {err:?}");
        assert!(store.get("ACCESS_TOKEN").is_none());

        assert!(store.delete("REFRESH_TOKEN").is_err());
        assert_eq!(store.get("REFRESH_TOKEN").as_deref(), Some("R1"));
    }

    #[cfg(unix)]
    #[test]
    fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.json");

        let store = FileStore::open(&path).unwrap();
        store.set("CLIENT_SECRET", "PRD-secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "property file must be 0600, got {mode:o}");
    }
}
