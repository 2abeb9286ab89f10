use crate::AppState;
use session_store::{DataDirectory, FsSessionStore, KeyMatch, NetworkInfo, Session};
use std::collections::BTreeMap;
use tempfile::TempDir;

pub const POOL: &str = "0xaAaAaAaaAaAaAaaAaAAAAAAAAaaaAaAaAaaAaaAa";
pub const ROUTER: &str = "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB";

/// Build the test app state over a fresh data directory.
/// The caller is responsible for keeping the TempDir alive for the duration of the test.
pub fn build_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let data_directory = DataDirectory::new(temp_dir.path().to_path_buf()).unwrap();
    let store = FsSessionStore::new(data_directory, KeyMatch::Substring);
    (AppState::new(store), temp_dir)
}

pub fn session(name: &str, address: &str, external: &[(&str, &str)]) -> Session {
    let mut session = Session {
        network_info: NetworkInfo {
            contract_name: name.to_string(),
            contract_address: address.to_string(),
            contract_network: "mainet".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    session.contract_data.external_addresses = Some(
        external
            .iter()
            .map(|(name, address)| (name.to_string(), address.to_string()))
            .collect::<BTreeMap<_, _>>(),
    );
    session
}
