//! The `sessionData.json` document.
//!
//! Sessions are produced by the external analysis service. This crate only reads the
//! fields the crawler needs and keeps everything else verbatim, so a session that is
//! loaded, enriched and saved again loses nothing the analyzer wrote.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Where and when the contract source was fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    #[serde(default, alias = "ContractName")]
    pub contract_name: String,
    #[serde(default, alias = "Address")]
    pub contract_address: String,
    #[serde(default, alias = "Network")]
    pub contract_network: String,
    #[serde(default, alias = "LastChecked", skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
    #[serde(default, alias = "Output_Dir")]
    pub data_directory: String,
}

/// Contract level facts. `external_calls` and `external_addresses` are absent until the
/// session has been enriched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractData {
    #[serde(default)]
    pub all_library_calls: Vec<String>,
    #[serde(default)]
    pub all_external_calls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_calls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_addresses: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableData {
    #[serde(default)]
    pub variable_name: String,
    #[serde(default)]
    pub variable_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_body: Option<String>,
    #[serde(default)]
    pub is_variable: bool,
    /// Resolved contract address, set during enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub network_info: NetworkInfo,
    #[serde(default)]
    pub contract_data: ContractData,
    #[serde(default)]
    pub functions_data: Vec<Value>,
    #[serde(default)]
    pub variables_data: Vec<VariableData>,
    #[serde(default)]
    pub scan_results: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    pub fn contract_name(&self) -> &str {
        &self.network_info.contract_name
    }

    pub fn contract_address(&self) -> &str {
        &self.network_info.contract_address
    }

    pub fn network(&self) -> &str {
        &self.network_info.contract_network
    }

    /// Resolved dependencies, empty for sessions that were never enriched.
    pub fn external_addresses(&self) -> impl Iterator<Item = (&str, &str)> {
        self.contract_data
            .external_addresses
            .iter()
            .flatten()
            .map(|(name, address)| (name.as_str(), address.as_str()))
    }

    pub fn external_calls(&self) -> &[String] {
        self.contract_data.external_calls.as_deref().unwrap_or_default()
    }

    pub fn is_enriched(&self) -> bool {
        self.contract_data.external_addresses.is_some()
    }
}
