//! In-memory [`SessionStore`] with the same key matching rules as the filesystem store.

use crate::errors::{Result, SessionStoreError};
use crate::session::Session;
use crate::store::{KeyMatch, SESSION_FILE_NAME, SessionStore, session_key};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    key_match: KeyMatch,
    /// Directory name -> document, `None` for a directory without a document.
    directories: RwLock<BTreeMap<String, Option<Session>>>,
}

impl InMemorySessionStore {
    pub fn new(key_match: KeyMatch) -> Self {
        Self {
            key_match,
            directories: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_sessions(sessions: impl IntoIterator<Item = Session>) -> Result<Self> {
        let store = Self::default();
        for session in sessions {
            store.save(&session)?;
        }
        Ok(store)
    }

    /// Registers a session directory that has no document, as left behind by a failed
    /// download.
    pub fn add_incomplete_directory(&self, directory_name: &str) {
        self.directories
            .write()
            .expect("session map lock poisoned")
            .insert(directory_name.to_string(), None);
    }

    pub fn len(&self) -> usize {
        self.directories
            .read()
            .expect("session map lock poisoned")
            .values()
            .filter(|session| session.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn document_path(directory_name: &str) -> PathBuf {
        Path::new(directory_name).join(SESSION_FILE_NAME)
    }

    fn directory_name(path: &Path) -> Option<String> {
        path.parent()?.to_str().map(str::to_string)
    }
}

impl SessionStore for InMemorySessionStore {
    fn exists(&self, address_or_partial: &str) -> Option<PathBuf> {
        let directories = self.directories.read().expect("session map lock poisoned");
        for (directory_name, session) in directories.iter() {
            if !self.key_match.matches(address_or_partial, directory_name) {
                continue;
            }
            if session.is_some() {
                return Some(Self::document_path(directory_name));
            }
            log::warn!("{} not found in: {}", SESSION_FILE_NAME, directory_name);
        }
        None
    }

    fn list_all(&self) -> Result<Vec<PathBuf>> {
        let directories = self.directories.read().expect("session map lock poisoned");
        Ok(directories
            .iter()
            .filter_map(|(directory_name, session)| {
                if session.is_none() {
                    log::info!(
                        "Skipping {}: {} not found",
                        directory_name,
                        SESSION_FILE_NAME
                    );
                }
                session
                    .as_ref()
                    .map(|_| Self::document_path(directory_name))
            })
            .collect())
    }

    fn load(&self, path: &Path) -> Result<Session> {
        let malformed = |reason: &str| SessionStoreError::MalformedSession {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        let directory_name = Self::directory_name(path).ok_or_else(|| malformed("bad path"))?;
        self.directories
            .read()
            .expect("session map lock poisoned")
            .get(&directory_name)
            .cloned()
            .flatten()
            .ok_or_else(|| malformed("document not found"))
    }

    fn save(&self, session: &Session) -> Result<PathBuf> {
        let key = session_key(session)?;
        let query = key.to_string();
        let mut directories = self.directories.write().expect("session map lock poisoned");
        let directory_name = directories
            .keys()
            .find(|name| KeyMatch::Exact.matches(&query, name))
            .cloned()
            .unwrap_or_else(|| key.directory_name(Some(session.contract_name())));
        directories.insert(directory_name.clone(), Some(session.clone()));
        Ok(Self::document_path(&directory_name))
    }
}
