use proxyup::batch::batches;
use proxyup::configuration::Settings;
use proxyup::results::UploadResults;
use proxyup::retry::{HttpUploadApi, RetryController};
use proxyup::source::RecordSource;
use proxyup::sources::advanced_name::AdvancedName;
use proxyup::storage;

use log::{info, warn};
use std::path::Path;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn) // Default warn
        .filter_module("proxyup", log::LevelFilter::Info) // proxyup info
        .init();

    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load config.toml: {}. Using defaults.", e);
            Settings::default()
        }
    };

    let started = Instant::now();

    let source = AdvancedName::with_url(&settings.listing_url);
    let records = source.collect(settings.max_records).await?;
    info!("{} yielded {} proxies", source.name(), records.len());

    storage::write_records(Path::new(&settings.proxies_file), &records);

    let api = HttpUploadApi::new(&settings)?;
    let controller = RetryController::new(api, settings.retry_policy(), settings.batch_pause());

    let mut results = UploadResults::new();
    controller
        .upload_all(batches(&records, settings.batch_size), &mut results)
        .await;

    storage::write_results(Path::new(&settings.results_file), &results);
    storage::write_elapsed(Path::new(&settings.time_file), started.elapsed());

    Ok(())
}
