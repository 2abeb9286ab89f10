//! # Session Store
//!
//! Persistent knowledge about analyzed contracts for the netmap crawler.
//!
//! This crate provides:
//! - The typed `sessionData.json` document model
//! - `network:address` target parsing and checksummed address normalization
//! - Centralized data directory management
//! - The [`SessionStore`] lookup contract with filesystem and in-memory implementations
//! - An address → session index regenerated on demand
//!
//! ## Usage
//!
//! ```rust,no_run
//! use session_store::{DataDirectory, FsSessionStore, KeyMatch, SessionStore};
//!
//! let data_directory = DataDirectory::new_system_default().unwrap();
//! let store = FsSessionStore::new(data_directory, KeyMatch::Substring);
//! if let Some(path) = store.exists("0x29d2bcf0d70f95ce16697e645e2b76d218d66109") {
//!     let session = store.load(&path).unwrap();
//!     println!("{}", session.network_info.contract_name);
//! }
//! ```

pub mod data_directory;
pub mod errors;
pub mod index;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod session;
pub mod store;
pub mod target;

pub use data_directory::DataDirectory;
pub use errors::{Result, SessionStoreError};
pub use index::AddressIndex;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemorySessionStore;
pub use session::{ContractData, NetworkInfo, Session, VariableData};
pub use store::{FsSessionStore, KeyMatch, SESSION_FILE_NAME, SessionStore};
pub use target::{SUPPORTED_NETWORKS, SessionKey, ZERO_ADDRESS, is_zero_address, normalize_address};
