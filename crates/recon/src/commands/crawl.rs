use anyhow::Result;
use netmap::crawl::{CrawlScheduler, CrawlState, FailureLedger, HttpDispatcher, RateLimiter};
use netmap::get_or_create_netmap_configuration;
use session_store::{DataDirectory, FsSessionStore};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::CrawlArgs;
use crate::commands::normalize_target;

pub fn run(data_directory: DataDirectory, args: CrawlArgs) -> Result<()> {
    let mut configuration = get_or_create_netmap_configuration(&data_directory);
    if let Some(dispatch_url) = args.dispatch_url {
        configuration.dispatch_url = dispatch_url;
    }
    if let Some(max_dispatches) = args.max_dispatches {
        configuration.max_dispatches_per_window = max_dispatches;
    }

    let target = args.target.as_deref().map(normalize_target).transpose()?;

    let ledger = FailureLedger::new(data_directory.failure_ledger_path.clone());
    let dispatcher = HttpDispatcher::new(
        configuration.dispatch_url.clone(),
        configuration.dispatch_timeout(),
        ledger,
    )?;
    let store = Arc::new(FsSessionStore::new(data_directory, configuration.key_match));
    let rate_limiter = RateLimiter::new(
        configuration.max_dispatches_per_window,
        configuration.dispatch_window(),
    );

    let mut scheduler =
        CrawlScheduler::new(store, dispatcher, args.level)?.with_rate_limiter(rate_limiter);
    info!(
        "Crawling with level {} against {}",
        scheduler.level(),
        configuration.dispatch_url
    );
    let report = scheduler.crawl(target.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Passes:     {}", report.passes);
        println!("Analyzed:   {}", report.count(CrawlState::Analyzed));
        println!("Dispatched: {}", report.dispatched.len());
        println!("Skipped:    {}", report.skipped());
        println!("Failed:     {}", report.failures.len());
        for target in &report.dispatched {
            println!("  {target}");
        }
    }

    if !report.failures.is_empty() {
        warn!(
            "{} dispatches failed, see the failure ledger in the data directory",
            report.failures.len()
        );
    }
    Ok(())
}
