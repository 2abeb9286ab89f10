//! Data directory management for the session-store crate
//!
//! This module handles the centralized data directory where every analysis session
//! produced for a contract is stored, together with the derived address index, the
//! dispatch failure ledger and the settings file.
//! The typical structure of the data directory would look like this:
//!
//! ```text
//! .netmap/
//! ├── sessions/
//! │   ├── mainet:0x29D2…6109:Vault/
//! │   │   ├── sessionData.json
//! │   │   ├── Vault.sol
//! │   ├── mainet:0xC02a…6Cc2:WETH9/
//! │   │   ├── sessionData.json
//! ├── address_index.json
//! ├── fails.jsonl
//! ├── netmap.settings.json
//! ├── logs/
//! ```

use crate::errors::{Result, SessionStoreError};
use std::path::{Path, PathBuf};

const NETMAP_DATA_DIR_NAME: &str = ".netmap";
const NETMAP_SESSIONS_NAME: &str = "sessions";
const NETMAP_ADDRESS_INDEX_FILE_NAME: &str = "address_index.json";
const NETMAP_FAILURE_LEDGER_FILE_NAME: &str = "fails.jsonl";
const NETMAP_SETTINGS_FILE_NAME: &str = "netmap.settings.json";
const NETMAP_LOGS_NAME: &str = "logs";

/// Manages the centralized data directory of the crawler
#[derive(Debug, Clone)]
pub struct DataDirectory {
    pub root_path: PathBuf,
    pub sessions_dir: PathBuf,
    pub address_index_path: PathBuf,
    pub failure_ledger_path: PathBuf,
    pub settings_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl DataDirectory {
    pub fn new_system_default() -> Result<Self> {
        let root_path = Self::get_system_data_directory()?;
        Self::new(root_path)
    }

    pub fn new(root_path: PathBuf) -> Result<Self> {
        let data_dir = Self {
            sessions_dir: root_path.join(NETMAP_SESSIONS_NAME),
            address_index_path: root_path.join(NETMAP_ADDRESS_INDEX_FILE_NAME),
            failure_ledger_path: root_path.join(NETMAP_FAILURE_LEDGER_FILE_NAME),
            settings_path: root_path.join(NETMAP_SETTINGS_FILE_NAME),
            logs_dir: root_path.join(NETMAP_LOGS_NAME),
            root_path,
        };
        data_dir.ensure_directory_structure()?;
        Ok(data_dir)
    }

    pub fn get_system_data_directory() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|data_dir| data_dir.join(NETMAP_DATA_DIR_NAME))
            .ok_or(SessionStoreError::SystemDataDirectoryNotFound)
    }

    pub fn session_directory(&self, directory_name: &str) -> PathBuf {
        self.sessions_dir.join(directory_name)
    }

    pub fn ensure_directory_structure(&self) -> Result<()> {
        for dir in [&self.root_path, &self.sessions_dir, &self.logs_dir] {
            Self::ensure_directory(dir)?;
        }
        Ok(())
    }

    pub fn ensure_session_directory(&self, directory_name: &str) -> Result<PathBuf> {
        let session_dir = self.session_directory(directory_name);
        Self::ensure_directory(&session_dir)?;
        Ok(session_dir)
    }

    fn ensure_directory(dir: &Path) -> Result<()> {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|_| {
                SessionStoreError::DataDirectoryCreationFailed {
                    path: dir.to_path_buf(),
                }
            })?;
            log::debug!("Created directory: {}", dir.display());
        }
        Ok(())
    }

    /// Names of every directory below `sessions/`, sorted.
    pub fn list_session_directories(&self) -> Result<Vec<String>> {
        if !self.sessions_dir.exists() {
            return Ok(Vec::new());
        }

        let mut session_dirs = Vec::with_capacity(16);
        for entry in std::fs::read_dir(&self.sessions_dir)? {
            let entry = entry?;
            if !entry.metadata()?.is_dir() {
                log::debug!("Skipping {}: not a directory", entry.path().display());
                continue;
            }
            match entry.file_name().to_str() {
                Some(dir_name) => session_dirs.push(dir_name.to_string()),
                None => log::warn!("Skipping {}: name is not UTF-8", entry.path().display()),
            }
        }

        session_dirs.sort();
        Ok(session_dirs)
    }
}
