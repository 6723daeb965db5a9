//! Persisted user preferences (consent, tracking tag).
//!
//! Storage is a capability: any read failure reports the key as absent, and
//! callers carry on without it. The uploader must keep working on a machine
//! where nothing can be persisted at all.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Preference key for the persisted consent choice.
pub const CONSENT_KEY: &str = "tracking_consent";

/// Preference key for the persisted tracking tag.
pub const TAG_KEY: &str = "tracking_tag";

/// Capability interface over a small persisted key/value store.
pub trait PrefStore {
    /// Read a preference. Missing, unreadable, or empty values all report
    /// the key as absent.
    fn read(&self, key: &str) -> Option<String>;

    /// Persist a preference. Callers treat failures as non-fatal.
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
}

/// File-per-key store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FilePrefStore {
    dir: PathBuf,
}

impl FilePrefStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FilePrefStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl PrefStore for FilePrefStore {
    fn read(&self, key: &str) -> Option<String> {
        let raw = fs::read_to_string(self.path_for(key)).ok()?;
        let val = raw.trim().to_string();
        if val.is_empty() { None } else { Some(val) }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    use super::PrefStore;

    /// In-memory store for unit tests.
    #[derive(Debug, Default)]
    pub struct MemPrefStore(Mutex<HashMap<String, String>>);

    impl MemPrefStore {
        pub fn new() -> Self {
            MemPrefStore::default()
        }
    }

    impl PrefStore for MemPrefStore {
        fn read(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).cloned()
        }

        fn write(&self, key: &str, value: &str) -> io::Result<()> {
            self.0.lock().unwrap().insert(key.into(), value.into());
            Ok(())
        }
    }

    /// Store where persistence is unavailable: reads find nothing, writes
    /// fail. Models a sandboxed or read-only environment.
    #[derive(Debug, Default)]
    pub struct BrokenPrefStore;

    impl PrefStore for BrokenPrefStore {
        fn read(&self, _key: &str) -> Option<String> {
            None
        }

        fn write(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "store unavailable"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePrefStore::new(dir.path());
        assert_eq!(store.read("tracking_tag"), None);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePrefStore::new(dir.path().join("prefs"));
        store.write(TAG_KEY, "demo").unwrap();
        assert_eq!(store.read(TAG_KEY), Some("demo".to_string()));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePrefStore::new(dir.path());
        store.write(CONSENT_KEY, "yes\n").unwrap();
        assert_eq!(store.read(CONSENT_KEY), Some("yes".to_string()));
    }

    #[test]
    fn empty_value_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePrefStore::new(dir.path());
        store.write(TAG_KEY, "  ").unwrap();
        assert_eq!(store.read(TAG_KEY), None);
    }
}
