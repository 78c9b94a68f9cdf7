//! Session persistence.
//!
//! The session is two key-value entries, `session_token` and `session_user`,
//! kept in a [`SessionStore`] and always written together. The file-backed
//! store holds an exclusive lock on a sidecar `.lock` file for the whole
//! read-modify-write and replaces the data file atomically, so concurrent
//! `clinic` invocations never observe a half-written file or a token paired
//! with another login's user.

use crate::types::{Role, User};
use crate::{Error, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key holding the opaque session token
pub const TOKEN_KEY: &str = "session_token";

/// Key holding the JSON-encoded [`User`]
pub const USER_KEY: &str = "session_user";

/// Durable string key-value storage for session entries
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write every entry in one step. Either all land or none do.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove every key in one step
    fn remove_many(&mut self, keys: &[&str]) -> Result<()>;

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }
}

/// In-process store, used by tests and embedders without a data directory
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

/// JSON object on disk, one entry per key
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn parent(&self) -> Result<&Path> {
        self.path.parent().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "session path missing parent",
            ))
        })
    }

    /// Load, apply `change`, and save while holding the writer lock
    ///
    /// Nothing is written when `change` reports no modification.
    fn modify<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        std::fs::create_dir_all(self.parent()?)?;
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let result = self.load().and_then(|mut entries| {
            if change(&mut entries) {
                self.save(&entries)
            } else {
                Ok(())
            }
        });

        lock.unlock()?;
        result
    }

    /// Read every entry under a shared lock
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and also treated as empty.
    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            tracing::debug!("No session file at {:?}", self.path);
            return Ok(BTreeMap::new());
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open session file {:?}: {}. Ignoring it.", self.path, e);
                return Ok(BTreeMap::new());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock session file {:?}: {}. Ignoring it.", self.path, e);
            return Ok(BTreeMap::new());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read session file {:?}: {}. Ignoring it.", self.path, e);
            return Ok(BTreeMap::new());
        }

        file.unlock()?;

        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(entries) => {
                tracing::debug!("Loaded {} session entries from {:?}", entries.len(), self.path);
                Ok(entries)
            }
            Err(e) => {
                tracing::warn!("Corrupt session file {:?}: {}. Ignoring it.", self.path, e);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Replace the file atomically under an exclusive lock
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let parent = self.parent()?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(entries)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved session file {:?}", self.path);
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        self.modify(|stored| {
            for (key, value) in entries {
                stored.insert(key.to_string(), value.to_string());
            }
            true
        })
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        self.modify(|stored| {
            let before = stored.len();
            stored.retain(|key, _| !keys.contains(&key.as_str()));
            stored.len() != before
        })
    }
}

/// The current identity, passed explicitly to whatever needs it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    /// No one signed in
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Read the identity left by a previous login
    ///
    /// Both entries must be present. A user entry that does not decode is
    /// logged and treated as no session.
    pub fn restore(store: &dyn SessionStore) -> Result<Self> {
        let token = store.get(TOKEN_KEY)?;
        let raw_user = store.get(USER_KEY)?;

        let (token, raw_user) = match (token, raw_user) {
            (Some(token), Some(raw_user)) => (token, raw_user),
            _ => {
                tracing::debug!("No stored session");
                return Ok(Self::anonymous());
            }
        };

        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => {
                tracing::debug!("Restored session for {}", user.email);
                Ok(Self {
                    token: Some(token),
                    user: Some(user),
                })
            }
            Err(e) => {
                tracing::warn!("Stored session user is corrupt: {}. Ignoring it.", e);
                Ok(Self::anonymous())
            }
        }
    }

    /// Start a session for `user`, writing both entries under a fresh token
    pub fn begin(store: &mut dyn SessionStore, user: User) -> Result<Self> {
        let token = uuid::Uuid::new_v4().to_string();
        let raw_user = serde_json::to_string(&user)?;
        store.set_many(&[(TOKEN_KEY, token.as_str()), (USER_KEY, raw_user.as_str())])?;
        tracing::info!("Session started for {} ({})", user.email, user.role.as_str());
        Ok(Self {
            token: Some(token),
            user: Some(user),
        })
    }

    /// Clear both entries and drop the identity
    pub fn end(&mut self, store: &mut dyn SessionStore) -> Result<()> {
        store.remove_many(&[TOKEN_KEY, USER_KEY])?;
        if let Some(user) = self.user.take() {
            tracing::info!("Session ended for {}", user.email);
        }
        self.token = None;
        Ok(())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> User {
        User {
            id: "1".into(),
            email: "admin@example-domain".into(),
            name: "Administrator".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_begin_and_restore_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");
        let mut store = FileStore::new(&path);

        let session = Session::begin(&mut store, admin()).unwrap();
        assert!(session.is_authenticated());

        let restored = Session::restore(&FileStore::new(&path)).unwrap();
        assert_eq!(restored, session);
        assert_eq!(restored.role(), Some(Role::Admin));
    }

    #[test]
    fn test_end_clears_both_entries() {
        let mut store = MemoryStore::new();
        let mut session = Session::begin(&mut store, admin()).unwrap();

        session.end(&mut store).unwrap();

        assert!(!session.is_authenticated());
        assert!(store.is_empty());
        assert!(!Session::restore(&store).unwrap().is_authenticated());
    }

    #[test]
    fn test_restore_needs_both_entries() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "abc").unwrap();
        assert!(!Session::restore(&store).unwrap().is_authenticated());
    }

    #[test]
    fn test_corrupt_user_entry_is_no_session() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "abc").unwrap();
        store.set(USER_KEY, "{not json").unwrap();
        assert!(!Session::restore(&store).unwrap().is_authenticated());
    }

    #[test]
    fn test_corrupt_file_is_empty_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);

        // A later write replaces the corrupt file
        let mut store = store;
        store.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_file_is_anonymous() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested").join("session.json"));
        assert_eq!(Session::restore(&store).unwrap(), Session::anonymous());
    }

    /// Counts writes and refuses single-key ones
    #[derive(Default)]
    struct BatchOnlyStore {
        inner: MemoryStore,
        writes: usize,
    }

    impl SessionStore for BatchOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
            self.writes += 1;
            self.inner.set_many(entries)
        }

        fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
            self.writes += 1;
            self.inner.remove_many(keys)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Session("single-key write".into()))
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(Error::Session("single-key remove".into()))
        }
    }

    #[test]
    fn test_begin_and_end_write_both_entries_at_once() {
        let mut store = BatchOnlyStore::default();

        let mut session = Session::begin(&mut store, admin()).unwrap();
        assert_eq!(store.writes, 1);
        assert!(store.get(TOKEN_KEY).unwrap().is_some());
        assert!(store.get(USER_KEY).unwrap().is_some());

        session.end(&mut store).unwrap();
        assert_eq!(store.writes, 2);
        assert!(store.inner.is_empty());
    }

    #[test]
    fn test_concurrent_writers_never_mix_token_and_user() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut store = FileStore::new(path);
                    for round in 0..10 {
                        let value = format!("{}-{}", i, round);
                        store
                            .set_many(&[(TOKEN_KEY, value.as_str()), (USER_KEY, value.as_str())])
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = FileStore::new(&path);
        let token = store.get(TOKEN_KEY).unwrap().unwrap();
        assert_eq!(store.get(USER_KEY).unwrap(), Some(token));
    }

    #[test]
    fn test_remove_many_keeps_other_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("session.json"));
        store
            .set_many(&[(TOKEN_KEY, "abc"), (USER_KEY, "{}"), ("theme", "dark")])
            .unwrap();

        store.remove_many(&[TOKEN_KEY, USER_KEY]).unwrap();

        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }
}
