pub mod advanced_name;

use reqwest::Client;
use std::time::Duration;

pub(crate) const SCRAPE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36";

pub fn new_client() -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}
