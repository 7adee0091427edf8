use crate::record::ProxyRecord;
use async_trait::async_trait;

/// A producer of proxy records, usually a scraped listing site.
///
/// `collect` yields validated records up to `limit`; rows that fail
/// validation are dropped at this boundary and never reach the upload
/// pipeline.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn collect(&self, limit: usize) -> anyhow::Result<Vec<ProxyRecord>>;
    fn name(&self) -> &'static str;
}
