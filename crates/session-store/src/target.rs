//! Session keys, supported networks and address normalization.
//!
//! A session is identified by the pair `(network, address)`, rendered as
//! `network:address` with the EIP-55 checksummed address so that case differences in
//! user input or chain responses never produce two keys for the same contract.

use crate::errors::{Result, SessionStoreError};
use alloy_primitives::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Network prefix used when a target is given as a bare address.
pub const DEFAULT_NETWORK: &str = "mainet";

/// Network prefixes and the block explorer host serving each of them.
/// Ordered by host length, longest first, so that sub-domains win over their parents.
pub const SUPPORTED_NETWORKS: &[(&str, &str)] = &[
    ("optim", "optimistic.etherscan.io"),
    ("mumbai", "testnet.polygonscan.com"),
    ("polyzk", "zkevm.polygonscan.com"),
    ("tobalaba", "tobalaba.etherscan.io"),
    ("testnet.avax", "testnet.snowtrace.io"),
    ("sepolia", "sepolia.etherscan.io"),
    ("testnet.bsc", "testnet.bscscan.com"),
    ("goerli", "goerli.etherscan.io"),
    ("goerli.base", "goerli.basescan.org"),
    ("testnet.arbi", "testnet.arbiscan.io"),
    ("poly", "polygonscan.com"),
    ("gno", "gnosisscan.io"),
    ("mainet", "etherscan.io"),
    ("base", "basescan.org"),
    ("avax", "snowtrace.io"),
    ("bsc", "bscscan.com"),
    ("arbi", "arbiscan.io"),
    ("ftm", "ftmscan.com"),
];

static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("valid address regex"));

pub fn is_supported_network(network: &str) -> bool {
    SUPPORTED_NETWORKS.iter().any(|(name, _)| *name == network)
}

/// Parses a `0x`-prefixed 40 hex character string into an address.
pub fn parse_address(value: &str) -> Option<Address> {
    let value = value.trim();
    if !ADDRESS_PATTERN.is_match(value) {
        return None;
    }
    Address::from_str(value).ok()
}

/// Returns the EIP-55 checksummed form of `value`, or `None` if it is not an address.
pub fn normalize_address(value: &str) -> Option<String> {
    parse_address(value).map(|address| address.to_checksum(None))
}

pub fn is_zero_address(value: &str) -> bool {
    parse_address(value).is_some_and(|address| address == Address::ZERO)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub network: String,
    pub address: Address,
}

impl SessionKey {
    pub fn new(network: &str, address: &str) -> Result<Self> {
        let target = format!("{network}:{address}");
        if !is_supported_network(network) {
            return Err(SessionStoreError::InvalidTarget {
                target,
                reason: format!("unsupported network `{network}`"),
            });
        }
        let address = parse_address(address).ok_or_else(|| SessionStoreError::InvalidTarget {
            target: target.clone(),
            reason: "expected a 0x-prefixed 40 hex character address".to_string(),
        })?;
        Ok(Self {
            network: network.to_string(),
            address,
        })
    }

    /// Parses `network:address`, `network:address:ContractName` or a bare address,
    /// which defaults to the mainnet prefix.
    pub fn parse(target: &str) -> Result<Self> {
        let target = target.trim();
        let mut parts = target.splitn(3, ':');
        match (parts.next(), parts.next()) {
            (Some(network), Some(address)) => Self::new(network, address),
            (Some(address), None) => Self::new(DEFAULT_NETWORK, address),
            _ => Err(SessionStoreError::InvalidTarget {
                target: target.to_string(),
                reason: "expected network:address".to_string(),
            }),
        }
    }

    /// Splits a session directory name `network:address[:ContractName]`.
    /// The network is not validated: directories written by older downloads are kept.
    pub fn from_directory_name(name: &str) -> Option<(Self, Option<String>)> {
        let mut parts = name.splitn(3, ':');
        let network = parts.next()?;
        let address = parse_address(parts.next()?)?;
        let contract_name = parts.next().map(str::to_string);
        Some((
            Self {
                network: network.to_string(),
                address,
            },
            contract_name,
        ))
    }

    /// Extracts a target from a block explorer URL such as
    /// `https://etherscan.io/address/0x...#code`.
    pub fn from_explorer_url(url: &str) -> Option<Self> {
        let without_scheme = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        let (domain, path) = without_scheme
            .split_once('/')
            .unwrap_or((without_scheme, ""));
        let path = path.split(['#', '?']).next().unwrap_or_default();

        let address = path.split('/').find_map(parse_address)?;
        let (network, _) = SUPPORTED_NETWORKS
            .iter()
            .find(|(_, host)| domain.contains(host))?;

        Some(Self {
            network: network.to_string(),
            address,
        })
    }

    pub fn checksummed_address(&self) -> String {
        self.address.to_checksum(None)
    }

    pub fn directory_name(&self, contract_name: Option<&str>) -> String {
        match contract_name {
            Some(name) if !name.is_empty() => format!("{self}:{name}"),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network, self.checksummed_address())
    }
}

impl FromStr for SessionKey {
    type Err = SessionStoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
