mod cli;
mod commands;

use crate::cli::{Commands, ReconCli};
use anyhow::Result;
use logging::LogMode;
use session_store::DataDirectory;

fn main() -> Result<()> {
    let cli = ReconCli::parse_args();

    let data_directory = match &cli.data_dir {
        Some(path) => DataDirectory::new(path.clone())?,
        None => DataDirectory::new_system_default()?,
    };

    let mode = match &cli.command {
        Commands::Server(_) => LogMode::ServerForeground,
        Commands::Graph(args) if args.json => LogMode::DataStdout,
        _ => LogMode::Cli,
    };
    let _guards = logging::init(mode, cli.verbose, &data_directory)?;

    match cli.command {
        Commands::Crawl(args) => commands::crawl::run(data_directory, args),
        Commands::Map(args) => commands::map::run(data_directory, args),
        Commands::Graph(args) => commands::graph::run(data_directory, args),
        Commands::Index => commands::index::run(data_directory),
        Commands::List(args) => commands::list::run(data_directory, args),
        Commands::Server(args) => commands::server::run(data_directory, args),
    }
}
