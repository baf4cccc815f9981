//! File-backed durable store
//!
//! Each key is stored as `<dir>/<key>.json`, written atomically so readers in
//! other processes never observe a half-written document. Other processes'
//! writes are picked up through an OS file watcher (inotify on Linux).

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use atomic_write_file::AtomicWriteFile;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::backend::{ChangeCallback, DurableBackend};
use super::StoreError;
use crate::common::constants::{config, storage};

/// Last document content this process wrote or already reported, per key.
/// Watcher events whose content matches are our own writes (or duplicate
/// events for one write) and are not reported.
type SeenDocuments = Arc<Mutex<HashMap<String, Option<String>>>>;

pub struct FileBackend {
    dir: PathBuf,
    seen: SeenDocuments,
    watchers: Mutex<Vec<RecommendedWatcher>>,
}

impl FileBackend {
    /// Open (creating if needed) a store directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        info!(path = %dir.display(), "Opened durable store");

        Ok(Self {
            dir,
            seen: Arc::new(Mutex::new(HashMap::new())),
            watchers: Mutex::new(Vec::new()),
        })
    }

    /// Default store directory under the user's data dir
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(storage::SUBDIR);
        path
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, storage::FILE_EXTENSION))
    }
}

fn read_document(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

impl DurableBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let document = read_document(&self.path_for(key))?;
        self.seen.lock().insert(key.to_string(), document.clone());
        Ok(document)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);

        // Record before writing: the watcher thread may see the event first
        self.seen
            .lock()
            .insert(key.to_string(), Some(value.to_string()));

        let mut file = AtomicWriteFile::options()
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| StoreError::io(&path, e))?;
        file.commit().map_err(|e| StoreError::io(&path, e))?;

        debug!(key = %key, path = %path.display(), bytes = value.len(), "Wrote document");
        Ok(())
    }

    fn on_change(&self, key: &str, callback: ChangeCallback) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let file_name = path.file_name().map(|name| name.to_os_string());
        let seen = Arc::clone(&self.seen);
        let key = key.to_string();
        let watched_key = key.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(key = %key, error = %e, "File watcher error");
                        return;
                    }
                };

                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                let touches_key = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == file_name.as_deref());
                if !touches_key {
                    return;
                }

                let document = match read_document(&path) {
                    Ok(document) => document,
                    Err(e) => {
                        warn!(key = %key, error = %e, "Failed to read changed document");
                        return;
                    }
                };

                {
                    let mut seen = seen.lock();
                    if seen.get(&key) == Some(&document) {
                        return;
                    }
                    seen.insert(key.clone(), document.clone());
                }

                debug!(key = %key, "Document changed by another process");
                callback(document);
            },
            Config::default(),
        )?;

        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;
        debug!(key = %watched_key, path = %self.dir.display(), "Watching for external changes");

        self.watchers.lock().push(watcher);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_get_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("settings").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.set("classColors", r##"{"Bard":{"color":"#341A9F"}}"##).unwrap();

        assert_eq!(
            backend.get("classColors").unwrap().as_deref(),
            Some(r##"{"Bard":{"color":"#341A9F"}}"##)
        );
        assert!(dir.path().join("classColors.json").exists());
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let backend = FileBackend::open(&nested).unwrap();
        assert_eq!(backend.dir(), nested.as_path());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_change_reaches_other_process_but_not_writer() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileBackend::open(dir.path()).unwrap();
        let reader = FileBackend::open(dir.path()).unwrap();

        let (writer_tx, writer_rx) = mpsc::channel();
        writer
            .on_change(
                "settings",
                Arc::new(move |doc: Option<String>| {
                    let _ = writer_tx.send(doc);
                }),
            )
            .unwrap();

        let (reader_tx, reader_rx) = mpsc::channel();
        reader
            .on_change(
                "settings",
                Arc::new(move |doc: Option<String>| {
                    let _ = reader_tx.send(doc);
                }),
            )
            .unwrap();

        writer.set("settings", r#"{"general":{}}"#).unwrap();

        let received = reader_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received.as_deref(), Some(r#"{"general":{}}"#));

        assert!(writer_rx.recv_timeout(Duration::from_millis(300)).is_err());
    }
}
