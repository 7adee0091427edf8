pub mod batch;
pub mod configuration;
pub mod record;
pub mod results;
pub mod retry;
pub mod session;
pub mod source;
pub mod sources;
pub mod storage;
pub mod submitter;

pub use record::ProxyRecord;
