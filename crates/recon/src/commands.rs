pub mod crawl;
pub mod graph;
pub mod index;
pub mod list;
pub mod map;
pub mod server;

use anyhow::Result;
use session_store::SessionKey;

/// Canonical `network:address` key of a crawl target given as key, bare address or
/// block explorer URL.
pub fn normalize_target(target: &str) -> Result<String> {
    let key = match SessionKey::from_explorer_url(target) {
        Some(key) => key,
        None => SessionKey::parse(target)?,
    };
    Ok(key.to_string())
}

/// Store lookup query of a target. Explorer URLs become their address, anything else
/// is matched against session directory names as given.
pub fn lookup_query(target: &str) -> String {
    match SessionKey::from_explorer_url(target) {
        Some(key) => key.checksummed_address(),
        None => target.trim().to_string(),
    }
}
