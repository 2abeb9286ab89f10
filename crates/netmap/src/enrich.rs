//! Writes resolved dependencies back into a session.
//!
//! Enrichment is the only mutation a session sees after the analysis service wrote it:
//! `contract_data.external_calls`, `contract_data.external_addresses` and the `address`
//! of each resolved variable. All fallible work happens before the single final save,
//! so a failed enrichment leaves the previous document untouched.

use crate::errors::{NetmapError, Result};
use crate::extractor::{extract_library_names, external_interfaces, filter_external_calls};
use crate::resolver::{AddressResolver, ContractReader, build_address_probe_set};
use serde::Serialize;
use session_store::target::parse_address;
use session_store::{Session, SessionStore};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub external_addresses: BTreeMap<String, String>,
    pub external_calls: Vec<String>,
    pub external_interfaces: BTreeSet<String>,
    /// Getters that were probed but did not resolve.
    pub unresolved: Vec<String>,
}

/// Resolves and filters the dependencies of `session` in place.
pub fn enrich_session<R: ContractReader>(
    session: &mut Session,
    resolver: &AddressResolver<R>,
) -> Result<EnrichmentSummary> {
    let contract = parse_address(session.contract_address())
        .ok_or_else(|| NetmapError::InvalidAddress(session.contract_address().to_string()))?;

    let probe_set = build_address_probe_set(&session.variables_data);
    let external_addresses = resolver.resolve(&contract, &probe_set);
    let unresolved = probe_set
        .probes
        .iter()
        .filter(|probe| !external_addresses.contains_key(&probe.name))
        .map(|probe| probe.name.clone())
        .collect();

    let library_names = extract_library_names(&session.contract_data.all_library_calls);
    let external_calls =
        filter_external_calls(&session.contract_data.all_external_calls, &library_names);

    for variable in &mut session.variables_data {
        if let Some(address) = external_addresses.get(&variable.variable_name) {
            variable.address = Some(address.clone());
        }
    }
    session.contract_data.external_calls = Some(external_calls.clone());
    session.contract_data.external_addresses = Some(external_addresses.clone());

    Ok(EnrichmentSummary {
        external_interfaces: external_interfaces(&external_calls),
        external_addresses,
        external_calls,
        unresolved,
    })
}

/// Loads the session matching `target`, enriches it and saves it back.
pub fn map_target<S, R>(
    store: &S,
    resolver: &AddressResolver<R>,
    target: &str,
) -> Result<(PathBuf, EnrichmentSummary)>
where
    S: SessionStore + ?Sized,
    R: ContractReader,
{
    let (_, mut session) = store.find(target)?;
    let summary = enrich_session(&mut session, resolver)?;
    let path = store.save(&session)?;

    info!(
        "Mapped {} ({}): {} external addresses, {} external calls",
        session.contract_name(),
        session.contract_address(),
        summary.external_addresses.len(),
        summary.external_calls.len()
    );
    Ok((path, summary))
}
