use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::colors::RiskLevel;

/// Per-district leakage figures supplied by the host, keyed by the
/// metrics-dataset spelling of the district name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    #[serde(alias = "district")]
    pub name: String,
    /// Declared-to-expected ratio in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(default, alias = "sub_case_count", skip_serializing_if = "Option::is_none")]
    pub sub_case_count: Option<u64>,
    #[serde(default, alias = "sub_office_count", skip_serializing_if = "Option::is_none")]
    pub sub_office_count: Option<u64>,
    #[serde(default, alias = "transaction_count", skip_serializing_if = "Option::is_none")]
    pub transaction_count: Option<u64>,
    #[serde(default, alias = "estimated_loss", skip_serializing_if = "Option::is_none")]
    pub estimated_loss: Option<f64>,
}

impl MetricRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }

    /// Ratio usable for colouring and ranking. Non-finite values count as
    /// missing.
    pub fn ratio_value(&self) -> Option<f64> {
        self.ratio.filter(|ratio| ratio.is_finite())
    }

    pub fn risk(&self) -> Option<RiskLevel> {
        self.ratio_value().map(RiskLevel::from_ratio)
    }
}

/// Lookup over one host refresh worth of metric records. The first record for
/// a name wins; later duplicates are kept aside for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricIndex {
    records: Vec<MetricRecord>,
    by_name: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl MetricIndex {
    pub fn new(records: Vec<MetricRecord>) -> Self {
        let mut by_name = HashMap::with_capacity(records.len());
        let mut duplicates = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            if by_name.contains_key(&record.name) {
                duplicates.push(record.name.clone());
            } else {
                by_name.insert(record.name.clone(), idx);
            }
        }
        Self {
            records,
            by_name,
            duplicates,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetricRecord> {
        self.by_name.get(name).map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_and_snake_case() {
        let json = r#"[
            { "name": "Anantapur", "ratio": 0.62, "subCaseCount": 14, "estimatedLoss": 1250000.0 },
            { "district": "Nellore", "ratio": 0.95, "sub_office_count": 3, "transaction_count": 880 },
            { "name": "Guntur" }
        ]"#;
        let records: Vec<MetricRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].sub_case_count, Some(14));
        assert_eq!(records[0].estimated_loss, Some(1_250_000.0));
        assert_eq!(records[1].name, "Nellore");
        assert_eq!(records[1].sub_office_count, Some(3));
        assert_eq!(records[1].transaction_count, Some(880));
        assert_eq!(records[2].ratio, None);
    }

    #[test]
    fn non_finite_ratio_counts_as_missing() {
        let record = MetricRecord::new("Kurnool").with_ratio(f64::NAN);
        assert_eq!(record.ratio_value(), None);
        assert_eq!(record.risk(), None);
    }

    #[test]
    fn first_record_wins_on_duplicate_names() {
        let index = MetricIndex::new(vec![
            MetricRecord::new("Nellore").with_ratio(0.95),
            MetricRecord::new("Nellore").with_ratio(0.10),
            MetricRecord::new("Anantapur").with_ratio(0.62),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("Nellore").and_then(|r| r.ratio), Some(0.95));
        assert_eq!(index.duplicates(), ["Nellore".to_string()]);
        assert!(index.get("Kadapa").is_none());
    }
}
