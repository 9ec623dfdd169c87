//! File-backed token storage.
//!
//! Tokens live in one small JSON document inside a capability-scoped
//! directory. Every mutation rewrites the document through a temp file and a
//! rename so a crash mid-write never leaves a truncated session behind.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::{Dir, OpenOptions};
use cap_std::ambient_authority;

use crate::domain::TokenKey;
use crate::domain::ports::{TokenStorage, TokenStorageError};

/// Default document name inside the session directory.
pub const SESSION_FILE_NAME: &str = "session.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

type SessionDocument = BTreeMap<String, String>;

/// Persistent token storage rooted in one directory.
pub struct FileTokenStorage {
    dir: Mutex<Dir>,
    file_name: String,
}

impl FileTokenStorage {
    /// Open (creating if needed) `directory` and store tokens in
    /// [`SESSION_FILE_NAME`] inside it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStorageError::Unavailable`] when the directory cannot be
    /// created or opened.
    pub fn open(directory: &Utf8Path) -> Result<Self, TokenStorageError> {
        Dir::create_ambient_dir_all(directory, ambient_authority()).map_err(|error| {
            TokenStorageError::unavailable(format!("create session directory '{directory}': {error}"))
        })?;
        let dir = Dir::open_ambient_dir(directory, ambient_authority()).map_err(|error| {
            TokenStorageError::unavailable(format!("open session directory '{directory}': {error}"))
        })?;
        Ok(Self::from_dir(dir))
    }

    /// Store tokens in an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self {
            dir: Mutex::new(dir),
            file_name: SESSION_FILE_NAME.to_owned(),
        }
    }

    fn dir(&self) -> MutexGuard<'_, Dir> {
        self.dir.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, dir: &Dir) -> Result<SessionDocument, TokenStorageError> {
        let contents = match dir.read_to_string(&self.file_name) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(SessionDocument::new());
            }
            Err(error) => {
                return Err(TokenStorageError::io(format!(
                    "read '{}': {error}",
                    self.file_name
                )));
            }
        };
        if contents.trim().is_empty() {
            return Ok(SessionDocument::new());
        }
        serde_json::from_str(&contents).map_err(|error| {
            TokenStorageError::corrupt(format!("parse '{}': {error}", self.file_name))
        })
    }

    fn store(&self, dir: &Dir, document: &SessionDocument) -> Result<(), TokenStorageError> {
        if document.is_empty() {
            return match dir.remove_file(&self.file_name) {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(TokenStorageError::io(format!(
                    "remove '{}': {error}",
                    self.file_name
                ))),
            };
        }
        let contents = serde_json::to_string_pretty(document).map_err(|error| {
            TokenStorageError::corrupt(format!("encode session document: {error}"))
        })?;
        write_atomic(dir, Utf8Path::new(&self.file_name), &contents)
            .map_err(|error| TokenStorageError::io(format!("write '{}': {error}", self.file_name)))
    }

    fn mutate<F>(&self, change: F) -> Result<(), TokenStorageError>
    where
        F: FnOnce(&mut SessionDocument),
    {
        let dir = self.dir();
        let mut document = match self.load(&dir) {
            Ok(document) => document,
            // A corrupt document is replaced rather than blocking new logins.
            Err(TokenStorageError::Corrupt { .. }) => SessionDocument::new(),
            Err(error) => return Err(error),
        };
        change(&mut document);
        self.store(&dir, &document)
    }
}

impl TokenStorage for FileTokenStorage {
    fn read(&self, key: TokenKey) -> Result<Option<String>, TokenStorageError> {
        let dir = self.dir();
        let mut document = self.load(&dir)?;
        Ok(document.remove(key.as_str()))
    }

    fn write(&self, key: TokenKey, value: &str) -> Result<(), TokenStorageError> {
        self.mutate(|document| {
            document.insert(key.as_str().to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: TokenKey) -> Result<(), TokenStorageError> {
        self.mutate(|document| {
            document.remove(key.as_str());
        })
    }
}

fn write_atomic(dir: &Dir, path: &Utf8Path, contents: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "session path must be a file"))?;
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = Utf8PathBuf::from(format!(
        ".{file_name}.tmp.{}.{counter}",
        std::process::id()
    ));

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(&tmp_name, &options)?;
    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.sync_all());
    drop(file);
    if let Err(error) = written.and_then(|()| dir.rename(&tmp_name, dir, file_name)) {
        // Best-effort cleanup; the original error is what matters.
        if dir.remove_file(&tmp_name).is_err() {
            // Ignore cleanup failures.
        }
        return Err(error);
    }
    Ok(())
}
