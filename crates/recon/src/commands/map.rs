use anyhow::Result;
use netmap::{
    AddressResolver, EnrichmentSummary, JsonRpcReader, get_or_create_netmap_configuration,
    map_target,
};
use session_store::{DataDirectory, FsSessionStore, SessionStore};
use std::path::Path;
use tracing::{error, info};

use crate::cli::MapArgs;
use crate::commands::lookup_query;

pub fn run(data_directory: DataDirectory, args: MapArgs) -> Result<()> {
    let mut configuration = get_or_create_netmap_configuration(&data_directory);
    if let Some(rpc_url) = args.rpc_url {
        configuration.rpc_url = rpc_url;
    }

    let reader = JsonRpcReader::new(configuration.rpc_url.clone(), configuration.rpc_timeout())?;
    let resolver = AddressResolver::new(reader);
    let store = FsSessionStore::new(data_directory, configuration.key_match);

    if !args.all {
        let target = lookup_query(args.target.as_deref().unwrap_or_default());
        let (path, summary) = map_target(&store, &resolver, &target)?;
        return print_summary(&path, &summary, args.json);
    }

    let pending: Vec<String> = store
        .sessions()?
        .into_iter()
        .filter(|(_, session)| !session.is_enriched())
        .map(|(_, session)| session.contract_address().to_string())
        .collect();
    info!("Mapping {} sessions against {}", pending.len(), configuration.rpc_url);

    let mut failed = 0;
    for target in &pending {
        match map_target(&store, &resolver, target) {
            Ok((path, summary)) => print_summary(&path, &summary, args.json)?,
            Err(e) => {
                error!("Failed to map {}: {}", target, e);
                failed += 1;
            }
        }
    }
    info!("Mapped {} of {} sessions", pending.len() - failed, pending.len());
    Ok(())
}

fn print_summary(path: &Path, summary: &EnrichmentSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }

    println!("{}", path.display());
    for (name, address) in &summary.external_addresses {
        println!("  {name}: {address}");
    }
    if !summary.external_interfaces.is_empty() {
        let interfaces: Vec<&str> = summary
            .external_interfaces
            .iter()
            .map(String::as_str)
            .collect();
        println!("  interfaces: {}", interfaces.join(", "));
    }
    if !summary.unresolved.is_empty() {
        println!("  unresolved: {}", summary.unresolved.join(", "));
    }
    Ok(())
}
