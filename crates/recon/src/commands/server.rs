use anyhow::Result;
use http_server::AppState;
use netmap::get_or_create_netmap_configuration;
use session_store::{DataDirectory, FsSessionStore};
use tracing::info;

use crate::cli::ServerArgs;

pub fn run(data_directory: DataDirectory, args: ServerArgs) -> Result<()> {
    let configuration = get_or_create_netmap_configuration(&data_directory);
    info!(
        "Serving sessions from {}",
        data_directory.sessions_dir.display()
    );
    let store = FsSessionStore::new(data_directory, configuration.key_match);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(http_server::run(&args.bind, AppState::new(store)))
}
