//! Blocking [`ContractReader`] over an alloy HTTP provider.
//!
//! The crawler and the CLI are synchronous, so each reader owns a current-thread tokio
//! runtime and drives the provider with `block_on`. Do not call it from inside another
//! runtime.

use crate::errors::{NetmapError, Result};
use crate::resolver::ContractReader;
use alloy_primitives::{Address, Bytes, keccak256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::{SolCall, sol};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

sol! {
    /// Zero-argument view getters that hand back a contract address.
    interface IAddressGetters {
        function owner() external view returns (address);
        function admin() external view returns (address);
        function implementation() external view returns (address);
        function factory() external view returns (address);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function asset() external view returns (address);
        function vault() external view returns (address);
        function pool() external view returns (address);
        function oracle() external view returns (address);
    }
}

/// Four byte selector of the zero-argument function `getter`. Names outside
/// [`IAddressGetters`] are hashed from their `name()` signature.
pub fn getter_selector(getter: &str) -> [u8; 4] {
    use IAddressGetters::*;
    match getter {
        "owner" => ownerCall::SELECTOR,
        "admin" => adminCall::SELECTOR,
        "implementation" => implementationCall::SELECTOR,
        "factory" => factoryCall::SELECTOR,
        "token0" => token0Call::SELECTOR,
        "token1" => token1Call::SELECTOR,
        "asset" => assetCall::SELECTOR,
        "vault" => vaultCall::SELECTOR,
        "pool" => poolCall::SELECTOR,
        "oracle" => oracleCall::SELECTOR,
        other => {
            let hash = keccak256(format!("{other}()").as_bytes());
            [hash[0], hash[1], hash[2], hash[3]]
        }
    }
}

/// Decodes `eth_call` return data as a single `address`. Every getter in
/// [`IAddressGetters`] shares the same return layout, so one generated decoder serves
/// all of them. Words with dirty upper bytes are rejected.
pub fn decode_address_return(data: &[u8]) -> std::result::Result<Address, String> {
    if data.is_empty() {
        return Err("empty return data (missing getter or reverted call)".to_string());
    }
    IAddressGetters::ownerCall::abi_decode_returns_validate(data).map_err(|e| e.to_string())
}

pub struct JsonRpcReader {
    runtime: Runtime,
    provider: DynProvider,
    url: String,
    timeout: Duration,
}

impl JsonRpcReader {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let endpoint = url
            .parse::<reqwest::Url>()
            .map_err(|e| NetmapError::Io(std::io::Error::other(format!("{url}: {e}"))))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(endpoint)
            .erased();
        Ok(Self {
            runtime,
            provider,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn eth_call(&self, contract: &Address, input: Bytes) -> std::result::Result<Bytes, String> {
        let request = TransactionRequest::default().to(*contract).input(input.into());
        self.runtime.block_on(async {
            match tokio::time::timeout(self.timeout, self.provider.call(request)).await {
                Ok(Ok(raw)) => Ok(raw),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {} ms", self.timeout.as_millis())),
            }
        })
    }
}

impl ContractReader for JsonRpcReader {
    fn call_address_getter(&self, contract: &Address, getter: &str) -> Result<Address> {
        let probe_error = |reason: String| NetmapError::AddressProbe {
            contract: contract.to_checksum(None),
            getter: getter.to_string(),
            reason,
        };

        debug!("eth_call {}() on {} via {}", getter, contract, self.url);
        let input = Bytes::copy_from_slice(&getter_selector(getter));
        let raw = self.eth_call(contract, input).map_err(probe_error)?;
        decode_address_return(&raw).map_err(probe_error)
    }
}
