//! Address → session document index.
//!
//! Written to `address_index.json` for tools that map an external address to the
//! local session analysing it without scanning directory names. The index is regenerated
//! from the store on demand and never updated incrementally, so it can lag behind
//! sessions written after the last rebuild.

use crate::errors::Result;
use crate::store::{SessionStore, session_key};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressIndex {
    pub generated_at: Option<DateTime<Utc>>,
    /// Checksummed address -> session document path
    pub entries: BTreeMap<String, PathBuf>,
}

impl AddressIndex {
    pub fn rebuild(store: &dyn SessionStore) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (path, session) in store.sessions()? {
            match session_key(&session) {
                Ok(key) => {
                    entries.insert(key.checksummed_address(), path);
                }
                Err(e) => log::warn!("Not indexing {}: {}", path.display(), e),
            }
        }

        log::info!("Indexed {} sessions", entries.len());
        Ok(Self {
            generated_at: Some(Utc::now()),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_directory::DataDirectory;
    use crate::session::{NetworkInfo, Session};
    use crate::store::{FsSessionStore, KeyMatch};
    use tempfile::TempDir;

    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const WETH_CHECKSUM: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    #[test]
    fn test_rebuild_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let data_directory = DataDirectory::new(temp_dir.path().to_path_buf()).unwrap();
        let index_path = data_directory.address_index_path.clone();
        let store = FsSessionStore::new(data_directory, KeyMatch::Substring);

        let saved = store
            .save(&Session {
                network_info: NetworkInfo {
                    contract_name: "WETH9".to_string(),
                    contract_address: WETH.to_string(),
                    contract_network: "mainet".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .unwrap();

        let index = AddressIndex::rebuild(&store).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries.get(WETH_CHECKSUM), Some(&saved));
        assert!(!index.entries.contains_key(WETH));

        index.save(&index_path).unwrap();
        assert_eq!(AddressIndex::load(&index_path).unwrap(), index);
    }
}
