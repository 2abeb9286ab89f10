//! Resolves the state variables of a contract that hold other contract addresses.
//!
//! Variables are split in two groups. Those whose declaration embeds an address literal
//! (`address constant WETH = 0xC02a...;`) are resolved statically. Every other
//! non-primitive variable is assumed to have a public zero-argument getter and is
//! probed with a read-only call against a live node.

use crate::errors::{NetmapError, Result};
use alloy_primitives::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use session_store::{VariableData, normalize_address};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Declared type prefixes that can never hold a single contract address.
pub const TYPE_EXCEPTIONS: [&str; 6] = ["uint", "int", "bool", "bytes", "string", "mapping"];

static ADDRESS_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0x[a-fA-F0-9]{40}").expect("valid address literal regex"));

pub fn is_probe_candidate(variable_type: &str) -> bool {
    !TYPE_EXCEPTIONS
        .iter()
        .any(|prefix| variable_type.starts_with(prefix))
}

/// A state variable to resolve through its getter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressProbe {
    pub name: String,
    pub variable_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressProbeSet {
    /// Variable name -> checksummed address taken from the declaration itself.
    pub literals: BTreeMap<String, String>,
    pub probes: Vec<AddressProbe>,
}

impl AddressProbeSet {
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.probes.is_empty()
    }
}

pub fn build_address_probe_set(variables: &[VariableData]) -> AddressProbeSet {
    let mut probe_set = AddressProbeSet::default();

    for variable in variables {
        if !variable.is_variable || !is_probe_candidate(&variable.variable_type) {
            continue;
        }

        let literal = variable
            .variable_body
            .as_deref()
            .and_then(|body| ADDRESS_LITERAL.find(body))
            .and_then(|literal| normalize_address(literal.as_str()));

        match literal {
            Some(address) => {
                probe_set
                    .literals
                    .insert(variable.variable_name.clone(), address);
            }
            None => probe_set.probes.push(AddressProbe {
                name: variable.variable_name.clone(),
                variable_type: variable.variable_type.clone(),
            }),
        }
    }

    probe_set
}

/// Read-only access to a deployed contract.
pub trait ContractReader {
    /// Calls the zero-argument getter `getter` on `contract` and decodes the returned
    /// word as an address.
    fn call_address_getter(&self, contract: &Address, getter: &str) -> Result<Address>;
}

impl<R: ContractReader + ?Sized> ContractReader for &R {
    fn call_address_getter(&self, contract: &Address, getter: &str) -> Result<Address> {
        (**self).call_address_getter(contract, getter)
    }
}

pub struct AddressResolver<R> {
    reader: R,
}

impl<R: ContractReader> AddressResolver<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Probes every getter of `probe_set` on `contract`, then merges the literal
    /// addresses on top. A failed probe is logged and left out; the rest still resolve.
    pub fn resolve(&self, contract: &Address, probe_set: &AddressProbeSet) -> BTreeMap<String, String> {
        let mut resolved = BTreeMap::new();

        for probe in &probe_set.probes {
            match self.reader.call_address_getter(contract, &probe.name) {
                Ok(address) => {
                    debug!("Resolved {}() on {} to {}", probe.name, contract, address);
                    resolved.insert(probe.name.clone(), address.to_checksum(None));
                }
                Err(e) => warn!("Error calling function {}: {}", probe.name, e),
            }
        }

        // Literals need no round trip and win on name collisions.
        resolved.extend(
            probe_set
                .literals
                .iter()
                .map(|(name, address)| (name.clone(), address.clone())),
        );
        resolved
    }

    pub fn resolve_variables(
        &self,
        contract: &str,
        variables: &[VariableData],
    ) -> Result<BTreeMap<String, String>> {
        let contract = session_store::target::parse_address(contract)
            .ok_or_else(|| NetmapError::InvalidAddress(contract.to_string()))?;
        Ok(self.resolve(&contract, &build_address_probe_set(variables)))
    }
}
