use crate::batch::Batch;
use crate::configuration::Settings;
use crate::results::UploadResults;
use crate::session::{NegotiationError, Session, SessionNegotiator};
use crate::submitter::{BatchSubmitter, UploadOutcome};
use async_trait::async_trait;
use log::{info, warn};
use std::time::Duration;
use tokio::time::sleep;

/// The HTTP side of one attempt, behind a trait so the controller can
/// be exercised without a network.
#[async_trait]
pub trait UploadApi: Send + Sync {
    async fn negotiate(&self) -> Result<Session, NegotiationError>;
    async fn submit(&self, session: &Session, batch: &Batch) -> UploadOutcome;
}

/// Production transport: negotiator plus submitter over real HTTP.
pub struct HttpUploadApi {
    negotiator: SessionNegotiator,
    submitter: BatchSubmitter,
}

impl HttpUploadApi {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            negotiator: SessionNegotiator::new(
                &settings.task_url,
                &settings.token_url,
                &settings.client_token,
            )?,
            submitter: BatchSubmitter::new(
                &settings.upload_url,
                &settings.task_url,
                &settings.client_token,
            )?,
        })
    }
}

#[async_trait]
impl UploadApi for HttpUploadApi {
    async fn negotiate(&self) -> Result<Session, NegotiationError> {
        self.negotiator.negotiate().await
    }

    async fn submit(&self, session: &Session, batch: &Batch) -> UploadOutcome {
        self.submitter.submit(session, batch).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Wait after the nth failed attempt (1-based): doubles from the
    /// initial delay, capped at the ceiling.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let delay = self.initial_delay.saturating_mul(2u32.saturating_pow(exp));
        delay.min(self.max_delay)
    }
}

/// Final state of one batch. Unconfirmed is a success for retry
/// purposes, but carries nothing to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResolution {
    Confirmed {
        save_id: String,
        endpoints: Vec<String>,
    },
    Unconfirmed,
    GivenUp {
        reason: String,
    },
}

enum Attempt {
    Resolved(BatchResolution),
    Retry(String),
}

/// Drives one batch through `Pending -> Attempting -> Succeeded |
/// GivenUp`: a fresh session negotiation before every submission,
/// exponential backoff between retryable failures, a hard cap on
/// attempts. Batches are independent; giving one up never aborts the
/// run.
pub struct RetryController<A: UploadApi> {
    api: A,
    policy: RetryPolicy,
    batch_pause: Duration,
}

impl<A: UploadApi> RetryController<A> {
    pub fn new(api: A, policy: RetryPolicy, batch_pause: Duration) -> Self {
        Self {
            api,
            policy,
            batch_pause,
        }
    }

    pub async fn run_batch(&self, batch: &Batch) -> BatchResolution {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            info!(
                "batch {}: attempt {}/{}",
                batch.seq, attempt, self.policy.max_attempts
            );
            match self.attempt_once(batch).await {
                Attempt::Resolved(resolution) => {
                    if let BatchResolution::GivenUp { reason } = &resolution {
                        warn!("batch {}: abandoned: {}", batch.seq, reason);
                    }
                    return resolution;
                }
                Attempt::Retry(reason) => {
                    if attempt >= self.policy.max_attempts {
                        warn!(
                            "batch {}: giving up after {} attempts: {}",
                            batch.seq, attempt, reason
                        );
                        return BatchResolution::GivenUp { reason };
                    }
                    let delay = self.policy.delay_for(attempt);
                    info!("batch {}: retrying in {:?}: {}", batch.seq, delay, reason);
                    sleep(delay).await;
                }
            }
        }
    }

    /// One attempt: negotiate a fresh session, then submit under it.
    /// Negotiation failures are always retryable.
    async fn attempt_once(&self, batch: &Batch) -> Attempt {
        let session = match self.api.negotiate().await {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    "batch {}: negotiation failed at {} stage: {}",
                    batch.seq,
                    e.stage(),
                    e
                );
                return Attempt::Retry(e.to_string());
            }
        };

        match self.api.submit(&session, batch).await {
            UploadOutcome::Success { save_id, endpoints } => {
                Attempt::Resolved(BatchResolution::Confirmed { save_id, endpoints })
            }
            UploadOutcome::Unconfirmed => Attempt::Resolved(BatchResolution::Unconfirmed),
            UploadOutcome::RetryableFailure(reason) => Attempt::Retry(reason),
            UploadOutcome::TerminalFailure(reason) => {
                Attempt::Resolved(BatchResolution::GivenUp { reason })
            }
        }
    }

    /// Politeness pause between consecutive batches.
    pub async fn pause_between_batches(&self) {
        sleep(self.batch_pause).await;
    }

    /// Runs every batch in sequence order, recording confirmed uploads
    /// into `results`. Unconfirmed and given-up batches add nothing.
    pub async fn upload_all<I>(&self, batches: I, results: &mut UploadResults)
    where
        I: IntoIterator<Item = Batch>,
    {
        for batch in batches {
            let seq = batch.seq;
            match self.run_batch(&batch).await {
                BatchResolution::Confirmed { save_id, endpoints } => {
                    info!("batch {}: confirmed as save_id {}", seq, save_id);
                    results.record(save_id, endpoints);
                }
                BatchResolution::Unconfirmed => {
                    warn!("batch {}: accepted without a save_id, nothing recorded", seq);
                }
                BatchResolution::GivenUp { reason } => {
                    warn!("batch {}: not uploaded: {}", seq, reason);
                }
            }
            self.pause_between_batches().await;
        }
    }
}
