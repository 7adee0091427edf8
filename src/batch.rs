use crate::record::ProxyRecord;

/// A fixed-maximum-size group of records submitted in one request.
///
/// Immutable once formed. `seq` starts at 1 and increases in arrival
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub seq: usize,
    pub records: Vec<ProxyRecord>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Endpoints in record order.
    pub fn endpoints(&self) -> Vec<String> {
        self.records.iter().map(ProxyRecord::endpoint).collect()
    }

    /// The comma-joined form the upload endpoint expects.
    pub fn joined_endpoints(&self) -> String {
        self.endpoints().join(",")
    }
}

/// Chunks `records` into batches of up to `batch_size` in arrival order,
/// last batch possibly shorter. No reordering, no filtering.
pub fn batches(records: &[ProxyRecord], batch_size: usize) -> impl Iterator<Item = Batch> + '_ {
    records
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(i, chunk)| Batch {
            seq: i + 1,
            records: chunk.to_vec(),
        })
}
