//! File outputs for a run: the raw collected list, the upload result
//! mapping, and the elapsed-time stamp. Write failures are logged and
//! never abort the run.

use crate::record::ProxyRecord;
use crate::results::UploadResults;
use log::{error, info};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// One compact record per line inside a JSON array.
pub fn render_records(records: &[ProxyRecord]) -> serde_json::Result<String> {
    let mut lines = Vec::with_capacity(records.len());
    for record in records {
        lines.push(format!("   {}", serde_json::to_string(record)?));
    }
    Ok(format!("[\n{}\n]\n", lines.join(",\n")))
}

pub fn write_records(path: &Path, records: &[ProxyRecord]) {
    let body = match render_records(records) {
        Ok(body) => body,
        Err(e) => {
            error!("failed to serialize records: {}", e);
            return;
        }
    };
    match fs::write(path, body) {
        Ok(()) => info!("wrote {} records to {}", records.len(), path.display()),
        Err(e) => error!("failed to write {}: {}", path.display(), e),
    }
}

pub fn write_results(path: &Path, results: &UploadResults) {
    let body = match results.finalize() {
        Ok(body) => body,
        Err(e) => {
            error!("failed to serialize results: {}", e);
            return;
        }
    };
    match fs::write(path, body) {
        Ok(()) => info!("wrote results for {} save ids to {}", results.len(), path.display()),
        Err(e) => error!("failed to write {}: {}", path.display(), e),
    }
}

pub fn write_elapsed(path: &Path, elapsed: Duration) {
    let stamp = format_elapsed(elapsed);
    match fs::write(path, &stamp) {
        Ok(()) => info!("run took {}", stamp),
        Err(e) => error!("failed to write {}: {}", path.display(), e),
    }
}

/// `HH:MM:SS`, hours not wrapped.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
