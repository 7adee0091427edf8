use crate::batch::Batch;
use crate::session::Session;
use log::warn;
use reqwest::{header, StatusCode, Url};
use serde::{Deserialize, Serialize};

/// Result of one submission attempt, classified for the retry
/// controller. No errors cross this boundary; everything becomes a
/// variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 2xx with a `save_id` in the body.
    Success {
        save_id: String,
        endpoints: Vec<String>,
    },
    /// 2xx with a parseable body but no `save_id`. The batch counts as
    /// uploaded, but nothing gets recorded for it.
    Unconfirmed,
    /// Worth another attempt: network failure or 429/5xx.
    RetryableFailure(String),
    /// Not worth retrying: other HTTP errors and malformed 2xx bodies.
    TerminalFailure(String),
}

#[derive(Serialize)]
struct UploadPayload<'a> {
    token: &'a str,
    user_id: &'a str,
    len: usize,
    proxies: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    save_id: Option<String>,
}

/// Executes one POST to the upload endpoint under a negotiated session.
pub struct BatchSubmitter {
    upload_url: Url,
    referer: Url,
    client_token: String,
}

impl BatchSubmitter {
    /// `referer` is the task page the form lives on; the server checks it.
    pub fn new(upload_url: &str, referer: &str, client_token: &str) -> anyhow::Result<Self> {
        Ok(Self {
            upload_url: Url::parse(upload_url)?,
            referer: Url::parse(referer)?,
            client_token: client_token.to_string(),
        })
    }

    pub async fn submit(&self, session: &Session, batch: &Batch) -> UploadOutcome {
        let endpoints = batch.endpoints();
        let payload = UploadPayload {
            token: &self.client_token,
            user_id: &self.client_token,
            len: batch.len(),
            proxies: endpoints.join(","),
        };

        let resp = match session
            .client
            .post(self.upload_url.clone())
            .header(header::REFERER, self.referer.as_str())
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("batch {}: request failed: {}", batch.seq, e);
                return UploadOutcome::RetryableFailure(format!("network error: {e}"));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return if retryable_status(status) {
                UploadOutcome::RetryableFailure(format!("http {status}"))
            } else {
                UploadOutcome::TerminalFailure(format!("http {status}"))
            };
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return UploadOutcome::RetryableFailure(format!("reading body: {e}")),
        };
        parse_upload_response(&body, endpoints)
    }
}

/// 429 and the transient 5xx family get another attempt; every other
/// error status is final.
pub(crate) fn retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

pub(crate) fn parse_upload_response(body: &str, endpoints: Vec<String>) -> UploadOutcome {
    let parsed: UploadResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => return UploadOutcome::TerminalFailure(format!("malformed response body: {e}")),
    };
    match parsed.save_id {
        Some(save_id) => UploadOutcome::Success { save_id, endpoints },
        None => {
            warn!("upload accepted but response carries no save_id");
            UploadOutcome::Unconfirmed
        }
    }
}
