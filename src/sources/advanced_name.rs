use super::{new_client, SCRAPE_USER_AGENT};
use crate::record::ProxyRecord;
use crate::source::RecordSource;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{info, warn};
use reqwest::Url;
use scraper::{Html, Selector};

const ADVANCED_NAME_URL: &str = "https://advanced.name/freeproxy";

/// Listing source for advanced.name. The ip and port cells are base64
/// encoded in `data-ip`/`data-port` attributes; pagination uses a `»`
/// link at the bottom of each page.
pub struct AdvancedName {
    url: String,
}

impl AdvancedName {
    pub fn new() -> Self {
        Self {
            url: ADVANCED_NAME_URL.to_string(),
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for AdvancedName {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSource for AdvancedName {
    async fn collect(&self, limit: usize) -> Result<Vec<ProxyRecord>> {
        let client = new_client()?;
        let mut url = Url::parse(&self.url)?;
        let mut records: Vec<ProxyRecord> = Vec::new();

        loop {
            info!("fetching listing page {}", url);
            let resp = client
                .get(url.clone())
                .header("Accept-Language", "en-US,en;q=0.8")
                .header("User-Agent", SCRAPE_USER_AGENT)
                .send()
                .await?
                .error_for_status()?;
            let body = resp.text().await?;

            let page = parse_listing(&body);
            if page.records.is_empty() {
                warn!("no proxy rows found on {}", url);
                break;
            }

            for record in page.records {
                if records.len() >= limit {
                    break;
                }
                records.push(record);
            }

            if records.len() >= limit {
                info!("collected {} proxies, not following next page", limit);
                break;
            }

            match page.next_page {
                Some(href) => url = url.join(&href)?,
                None => {
                    info!("no more pages");
                    break;
                }
            }
        }

        if records.is_empty() {
            return Err(anyhow!("proxies not found"));
        }
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "advanced.name"
    }
}

pub(crate) struct ListingPage {
    pub records: Vec<ProxyRecord>,
    pub next_page: Option<String>,
}

/// Parses one listing page. Rows with undecodable or missing cells are
/// skipped with a warning; they never become records.
pub(crate) fn parse_listing(body: &str) -> ListingPage {
    let doc = Html::parse_document(body);
    let row_selector = Selector::parse("table#table_proxies tbody tr").unwrap();
    let td_selector = Selector::parse("td").unwrap();
    let a_selector = Selector::parse("a").unwrap();

    let mut records = Vec::new();
    for row in doc.select(&row_selector) {
        let cols: Vec<_> = row.select(&td_selector).collect();
        if cols.len() < 4 {
            continue;
        }

        let ip = match cols[1].value().attr("data-ip").and_then(decode_cell) {
            Some(ip) => ip,
            None => {
                warn!("could not decode ip cell, skipping row");
                continue;
            }
        };
        let port = match cols[2]
            .value()
            .attr("data-port")
            .and_then(decode_cell)
            .and_then(|p| p.parse::<u16>().ok())
        {
            Some(port) => port,
            None => {
                warn!("could not decode port cell, skipping row");
                continue;
            }
        };
        let protocols: Vec<String> = cols[3]
            .select(&a_selector)
            .map(|a| a.text().collect::<String>().trim().to_string())
            .collect();

        match ProxyRecord::new(ip, port, protocols) {
            Some(record) => records.push(record),
            None => warn!("skipping row with missing data"),
        }
    }

    let next_selector = Selector::parse("ul.pagination a").unwrap();
    let next_page = doc
        .select(&next_selector)
        .find(|a| a.text().collect::<String>().contains('\u{bb}'))
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    ListingPage { records, next_page }
}

fn decode_cell(encoded: &str) -> Option<String> {
    let bytes = BASE64.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    Some(text.trim().to_string())
}
