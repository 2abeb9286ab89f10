use anyhow::Result;
use netmap::get_or_create_netmap_configuration;
use session_store::{AddressIndex, DataDirectory, FsSessionStore};
use tracing::info;

pub fn run(data_directory: DataDirectory) -> Result<()> {
    let configuration = get_or_create_netmap_configuration(&data_directory);
    let index_path = data_directory.address_index_path.clone();
    let store = FsSessionStore::new(data_directory, configuration.key_match);

    let index = AddressIndex::rebuild(&store)?;
    index.save(&index_path)?;
    info!("Indexed {} sessions into {}", index.len(), index_path.display());
    Ok(())
}
