use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::{KeyValueStore, Result};
use crate::utils::atomic_file::write_atomic;

const DOCUMENT_EXTENSION: &str = "json";

/// Filesystem-backed store keeping one JSON document per key inside `root`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_name(key), DOCUMENT_EXTENSION))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.document_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_atomic(&self.document_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.document_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "document".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::atomic_file::tmp_path;
    use tempfile::tempdir;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path()).expect("store");
        assert_eq!(store.get("zenith-txns").expect("get"), None);
    }

    #[test]
    fn set_then_get_round_trips_and_leaves_no_tmp_file() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path()).expect("store");
        store.set("zenith-txns", "[]").expect("set");

        assert_eq!(store.get("zenith-txns").expect("get").as_deref(), Some("[]"));
        let path = store.document_path("zenith-txns");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("zenith-txns.json"));
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn failed_write_preserves_previous_document() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path()).expect("store");
        store.set("zenith-txns", "[1]").expect("initial write");

        // A directory squatting on the temp file name makes File::create fail.
        let path = store.document_path("zenith-txns");
        fs::create_dir_all(tmp_path(&path)).expect("block tmp path");

        assert!(store.set("zenith-txns", "[1,2]").is_err());
        assert_eq!(store.get("zenith-txns").expect("get").as_deref(), Some("[1]"));
    }

    #[test]
    fn remove_deletes_document() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path()).expect("store");
        store.set("bills", "[]").expect("set");
        store.remove("bills").expect("remove");
        store.remove("bills").expect("removing twice is fine");
        assert_eq!(store.get("bills").expect("get"), None);
    }

    #[test]
    fn canonical_name_sanitizes_keys() {
        assert_eq!(canonical_name("Zenith Txns"), "zenith_txns");
        assert_eq!(canonical_name("../"), "document");
    }
}
