use anyhow::Result;
use netmap::get_or_create_netmap_configuration;
use netmap::graph::{
    AnalysisOptions, GraphStatistics, NodeLinkGraph, ProtocolGraphBuilder, analyze,
};
use serde::Serialize;
use session_store::{DataDirectory, FsSessionStore};
use std::fs;
use tracing::info;

use crate::cli::GraphArgs;

#[derive(Serialize)]
struct GraphOutput<'a> {
    graph: &'a NodeLinkGraph,
    statistics: &'a GraphStatistics,
}

pub fn run(data_directory: DataDirectory, args: GraphArgs) -> Result<()> {
    let configuration = get_or_create_netmap_configuration(&data_directory);
    let store = FsSessionStore::new(data_directory, configuration.key_match);

    let graph = ProtocolGraphBuilder::from_store(&store)?;
    let options = AnalysisOptions {
        exclude_zero_address: args.exclude_zero,
        ..Default::default()
    };
    let statistics = analyze(&graph, &options);
    let node_link = graph.to_node_link();

    if let Some(output) = &args.output {
        fs::write(output, serde_json::to_string_pretty(&node_link)?)?;
        info!("Node-link graph written to {}", output.display());
    }

    if args.json {
        let output = GraphOutput {
            graph: &node_link,
            statistics: &statistics,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_statistics(&statistics);
    Ok(())
}

fn print_statistics(statistics: &GraphStatistics) {
    println!("Nodes:            {}", statistics.node_count);
    println!("Edges:            {}", statistics.edge_count);
    println!("Isolated nodes:   {}", statistics.isolated_nodes);
    println!("Network size:     {:.3}", statistics.network_size);
    println!("Cluster strength: {:.3}", statistics.cluster_strength);
    println!(
        "Core threshold:   {:.3} ({} core, {} periphery)",
        statistics.centrality_threshold,
        statistics.core.len(),
        statistics.periphery.len()
    );

    for address in &statistics.core {
        if let Some(node) = statistics.centrality_of(address) {
            println!("  core {} {} ({:.3})", node.address, node.label, node.degree);
        }
    }
    for component in statistics.cycles() {
        println!(
            "  cycle of {} (density {:.3}): {}",
            component.size,
            component.density,
            component.members.join(" ")
        );
    }
}
