use serde::Serialize;
use std::fmt;

/// A single proxy endpoint discovered on a listing page.
///
/// Records are validated at construction; a partially filled row never
/// becomes a `ProxyRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyRecord {
    pub ip: String,
    pub port: u16,
    pub protocols: Vec<String>,
}

impl ProxyRecord {
    /// Builds a record, returning `None` when any field is missing or
    /// out of range. Duplicate protocol names are dropped, first
    /// occurrence wins.
    pub fn new(
        ip: impl Into<String>,
        port: u16,
        protocols: impl IntoIterator<Item = String>,
    ) -> Option<Self> {
        let ip = ip.into();
        if ip.trim().is_empty() || port == 0 {
            return None;
        }

        let mut deduped: Vec<String> = Vec::new();
        for proto in protocols {
            let proto = proto.trim().to_string();
            if !proto.is_empty() && !deduped.contains(&proto) {
                deduped.push(proto);
            }
        }
        if deduped.is_empty() {
            return None;
        }

        Some(Self {
            ip,
            port,
            protocols: deduped,
        })
    }

    /// The `"ip:port"` form used in upload payloads and result files.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.endpoint(), self.protocols.join(", "))
    }
}
