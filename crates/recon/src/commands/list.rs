use anyhow::Result;
use session_store::{DataDirectory, FsSessionStore, KeyMatch, SESSION_FILE_NAME, SessionStore};

use crate::cli::ListArgs;

pub fn run(data_directory: DataDirectory, args: ListArgs) -> Result<()> {
    let store = FsSessionStore::new(data_directory, KeyMatch::default());

    if args.header {
        println!("Sessions:");
    }
    for (directory_name, path) in store.session_directories()? {
        let document = path.join(SESSION_FILE_NAME);
        let status = if !document.is_file() {
            "incomplete"
        } else {
            match store.load(&document) {
                Ok(session) if session.is_enriched() => "mapped",
                Ok(_) => "analyzed",
                Err(_) => "malformed",
            }
        };
        // We're printing to stdout, so we don't need to use tracing
        println!("{directory_name}\t{status}");
    }
    Ok(())
}
