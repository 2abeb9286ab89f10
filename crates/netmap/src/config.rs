use crate::errors::Result;
use serde::{Deserialize, Serialize};
use session_store::{DataDirectory, KeyMatch};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";
pub const DEFAULT_DISPATCH_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetmapConfiguration {
    /// JSON-RPC node used to probe address getters.
    pub rpc_url: String,
    /// Base URL of the analysis service that produces new sessions.
    pub dispatch_url: String,
    pub max_dispatches_per_window: usize,
    pub dispatch_window_ms: u64,
    pub rpc_timeout_secs: u64,
    pub dispatch_timeout_secs: u64,
    pub key_match: KeyMatch,
}

impl NetmapConfiguration {
    pub fn new() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            dispatch_url: DEFAULT_DISPATCH_URL.to_string(),
            max_dispatches_per_window: 5,
            dispatch_window_ms: 1000,
            rpc_timeout_secs: 10,
            // A full analysis downloads and compiles sources.
            dispatch_timeout_secs: 600,
            key_match: KeyMatch::Substring,
        }
    }

    pub fn dispatch_window(&self) -> Duration {
        Duration::from_millis(self.dispatch_window_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for NetmapConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

pub fn read_netmap_configuration(path: &Path) -> NetmapConfiguration {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(
                "Could not read netmap configuration: {}. Returning default configuration.",
                e
            );
            return NetmapConfiguration::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(configuration) => configuration,
        Err(e) => {
            warn!(
                "Could not parse netmap configuration: {}. Returning default configuration.",
                e
            );
            NetmapConfiguration::default()
        }
    }
}

/// Reads the settings file of `data_directory`, writing the defaults first if it does
/// not exist yet.
pub fn get_or_create_netmap_configuration(data_directory: &DataDirectory) -> NetmapConfiguration {
    let configuration_path = &data_directory.settings_path;

    if !configuration_path.exists() {
        let new_configuration = NetmapConfiguration::default();
        if let Err(e) = new_configuration.save(configuration_path) {
            warn!(
                "Could not save netmap configuration: {}. Returning default configuration.",
                e
            );
            return new_configuration;
        }

        info!(
            "Created new netmap configuration file at {}.",
            configuration_path.display()
        );
        return new_configuration;
    }

    read_netmap_configuration(configuration_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_data_directory() -> (DataDirectory, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let data_directory = DataDirectory::new(temp_dir.path().to_path_buf()).unwrap();
        (data_directory, temp_dir)
    }

    #[test]
    fn test_default_configuration() {
        let config = NetmapConfiguration::default();
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.max_dispatches_per_window, 5);
        assert_eq!(config.dispatch_window(), Duration::from_secs(1));
        assert_eq!(config.key_match, KeyMatch::Substring);
    }

    #[test]
    fn test_get_or_create_writes_defaults() {
        let (data_directory, _temp_dir) = create_data_directory();
        assert!(!data_directory.settings_path.exists());

        let config = get_or_create_netmap_configuration(&data_directory);
        assert_eq!(config, NetmapConfiguration::default());
        assert!(data_directory.settings_path.exists());
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let (data_directory, _temp_dir) = create_data_directory();
        fs::write(
            &data_directory.settings_path,
            r#"{"rpc_url": "http://localhost:8545", "key_match": "exact"}"#,
        )
        .unwrap();

        let config = get_or_create_netmap_configuration(&data_directory);
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.key_match, KeyMatch::Exact);
        assert_eq!(config.dispatch_url, DEFAULT_DISPATCH_URL);
    }

    #[test]
    fn test_invalid_file_returns_default() {
        let (data_directory, _temp_dir) = create_data_directory();
        fs::write(&data_directory.settings_path, "invalid json").unwrap();

        let config = read_netmap_configuration(&data_directory.settings_path);
        assert_eq!(config, NetmapConfiguration::default());
    }
}
