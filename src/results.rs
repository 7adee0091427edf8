use serde::ser::Error as _;
use serde::Serialize;
use std::collections::BTreeMap;

/// Append-only map from server-issued save id to the endpoints uploaded
/// under it, accumulated across all confirmed batches of a run. Keys
/// stay sorted so the persisted file is stable between runs.
#[derive(Debug, Default)]
pub struct UploadResults {
    map: BTreeMap<String, Vec<String>>,
}

impl UploadResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the entry for `save_id`, creating it if absent. A
    /// recurring id concatenates endpoint lists in batch order; nothing
    /// is ever overwritten.
    pub fn record(&mut self, save_id: impl Into<String>, endpoints: Vec<String>) {
        self.map.entry(save_id.into()).or_default().extend(endpoints);
    }

    pub fn get(&self, save_id: &str) -> Option<&[String]> {
        self.map.get(save_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Full mapping as four-space-indented JSON for persistence.
    pub fn finalize(&self) -> serde_json::Result<String> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.map.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(serde_json::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eps(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn records_a_new_id() {
        let mut results = UploadResults::new();
        results.record("id-1", eps(&["1.2.3.4:80"]));
        assert_eq!(results.get("id-1"), Some(&["1.2.3.4:80".to_string()][..]));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn recurring_id_concatenates_in_batch_order() {
        let mut results = UploadResults::new();
        results.record("id-1", eps(&["1.1.1.1:80", "2.2.2.2:81"]));
        results.record("id-1", eps(&["3.3.3.3:82"]));
        assert_eq!(
            results.get("id-1").unwrap(),
            &eps(&["1.1.1.1:80", "2.2.2.2:81", "3.3.3.3:82"])[..]
        );
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn finalize_serializes_the_mapping() {
        let mut results = UploadResults::new();
        results.record("id-1", eps(&["1.2.3.4:8080"]));
        let json = results.finalize().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["id-1"][0], "1.2.3.4:8080");
    }

    #[test]
    fn finalize_is_deterministic_and_four_space_indented() {
        let mut results = UploadResults::new();
        results.record("id-b", eps(&["1.1.1.1:80"]));
        results.record("id-a", eps(&["2.2.2.2:81"]));
        let json = results.finalize().unwrap();

        // keys come out sorted regardless of record order
        assert!(json.find("id-a").unwrap() < json.find("id-b").unwrap());
        assert!(json.contains("\n    \"id-a\""), "json: {json}");

        assert_eq!(json, results.finalize().unwrap());
    }
}
