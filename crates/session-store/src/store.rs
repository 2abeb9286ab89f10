//! Lookup contract over the corpus of analyzed sessions.
//!
//! The store is the only deduplication ledger of the crawler: a contract counts as
//! analyzed exactly when a directory matching its address holds a readable session
//! document. Writes are visible to the next lookup in the same process (read after
//! write). There is no cross-process locking; two writers of the same key race and the
//! last complete write wins.

use crate::data_directory::DataDirectory;
use crate::errors::{Result, SessionStoreError};
use crate::session::Session;
use crate::target::{DEFAULT_NETWORK, SessionKey, parse_address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_FILE_NAME: &str = "sessionData.json";

/// How `exists` compares a query against session directory names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMatch {
    /// The directory name contains the query, ignoring ASCII case. Tolerates partial
    /// queries and unknown network prefixes, but an address that is a substring of
    /// another directory name matches that directory.
    #[default]
    Substring,
    /// The query is parsed as `network:address` or a bare address and compared to the
    /// key encoded in the directory name. A bare address matches on every network.
    Exact,
}

impl KeyMatch {
    pub fn matches(self, query: &str, directory_name: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        match self {
            KeyMatch::Substring => directory_name
                .to_ascii_lowercase()
                .contains(&query.to_ascii_lowercase()),
            KeyMatch::Exact => {
                let Some((directory_key, _)) = SessionKey::from_directory_name(directory_name)
                else {
                    return false;
                };
                match SessionKey::from_directory_name(query) {
                    Some((query_key, _)) => query_key == directory_key,
                    None => parse_address(query) == Some(directory_key.address),
                }
            }
        }
    }
}

pub trait SessionStore {
    /// Path of the session document of the first directory matching
    /// `address_or_partial`, if any. Matching directories without a readable document
    /// are logged and skipped.
    fn exists(&self, address_or_partial: &str) -> Option<PathBuf>;

    /// Session document paths of every complete session directory.
    fn list_all(&self) -> Result<Vec<PathBuf>>;

    fn load(&self, path: &Path) -> Result<Session>;

    /// Persists `session` under its `network:address` key, replacing the previous
    /// document of that key. Returns the document path.
    fn save(&self, session: &Session) -> Result<PathBuf>;

    fn find(&self, address_or_partial: &str) -> Result<(PathBuf, Session)> {
        let path = self
            .exists(address_or_partial)
            .ok_or_else(|| SessionStoreError::SessionNotFound {
                query: address_or_partial.to_string(),
            })?;
        let session = self.load(&path)?;
        Ok((path, session))
    }

    /// Every loadable session. Malformed documents are logged and treated as absent.
    fn sessions(&self) -> Result<Vec<(PathBuf, Session)>> {
        let mut sessions = Vec::new();
        for path in self.list_all()? {
            match self.load(&path) {
                Ok(session) => sessions.push((path, session)),
                Err(e) => log::warn!("Skipping session {}: {}", path.display(), e),
            }
        }
        Ok(sessions)
    }
}

/// Key under which a session is stored, derived from its `network_info`.
pub fn session_key(session: &Session) -> Result<SessionKey> {
    let address = session.contract_address();
    let address = parse_address(address).ok_or_else(|| SessionStoreError::InvalidTarget {
        target: address.to_string(),
        reason: "session has no valid contract_address".to_string(),
    })?;
    let network = match session.network() {
        "" => DEFAULT_NETWORK,
        network => network,
    };
    Ok(SessionKey {
        network: network.to_string(),
        address,
    })
}

pub fn parse_session_document(path: &Path, content: &str) -> Result<Session> {
    serde_json::from_str(content).map_err(|e| SessionStoreError::MalformedSession {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Sessions stored as `sessions/<network:address[:ContractName]>/sessionData.json`.
#[derive(Debug, Clone)]
pub struct FsSessionStore {
    data_directory: DataDirectory,
    key_match: KeyMatch,
}

impl FsSessionStore {
    pub fn new(data_directory: DataDirectory, key_match: KeyMatch) -> Self {
        Self {
            data_directory,
            key_match,
        }
    }

    pub fn data_directory(&self) -> &DataDirectory {
        &self.data_directory
    }

    pub fn key_match(&self) -> KeyMatch {
        self.key_match
    }

    /// Every session directory by name, including incomplete ones.
    pub fn session_directories(&self) -> Result<BTreeMap<String, PathBuf>> {
        Ok(self
            .data_directory
            .list_session_directories()?
            .into_iter()
            .map(|name| {
                let path = self.data_directory.session_directory(&name);
                (name, path)
            })
            .collect())
    }

    fn document_path(&self, directory_name: &str) -> PathBuf {
        self.data_directory
            .session_directory(directory_name)
            .join(SESSION_FILE_NAME)
    }

    fn directory_for_key(&self, key: &SessionKey) -> Result<Option<String>> {
        let query = key.to_string();
        Ok(self
            .data_directory
            .list_session_directories()?
            .into_iter()
            .find(|name| KeyMatch::Exact.matches(&query, name)))
    }
}

impl SessionStore for FsSessionStore {
    fn exists(&self, address_or_partial: &str) -> Option<PathBuf> {
        let directories = match self.data_directory.list_session_directories() {
            Ok(directories) => directories,
            Err(e) => {
                log::error!("Could not list session directories: {}", e);
                return None;
            }
        };

        for directory_name in directories {
            if !self.key_match.matches(address_or_partial, &directory_name) {
                continue;
            }
            let document_path = self.document_path(&directory_name);
            if document_path.is_file() {
                return Some(document_path);
            }
            log::warn!("{} not found in: {}", SESSION_FILE_NAME, directory_name);
        }

        None
    }

    fn list_all(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for directory_name in self.data_directory.list_session_directories()? {
            let document_path = self.document_path(&directory_name);
            if document_path.is_file() {
                paths.push(document_path);
            } else {
                log::info!(
                    "Skipping {}: {} not found",
                    directory_name,
                    SESSION_FILE_NAME
                );
            }
        }
        Ok(paths)
    }

    fn load(&self, path: &Path) -> Result<Session> {
        let content = fs::read_to_string(path).map_err(|e| SessionStoreError::MalformedSession {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        parse_session_document(path, &content)
    }

    fn save(&self, session: &Session) -> Result<PathBuf> {
        let key = session_key(session)?;
        let directory_name = match self.directory_for_key(&key)? {
            Some(existing) => existing,
            None => key.directory_name(Some(session.contract_name())),
        };
        let session_dir = self.data_directory.ensure_session_directory(&directory_name)?;
        let document_path = session_dir.join(SESSION_FILE_NAME);

        // Write next to the target and rename so readers never see a partial document.
        let staging_path = session_dir.join(format!("{SESSION_FILE_NAME}.tmp"));
        fs::write(&staging_path, serde_json::to_string_pretty(session)?)?;
        fs::rename(&staging_path, &document_path)?;

        log::debug!("Saved session {} to {}", key, document_path.display());
        Ok(document_path)
    }
}
