use serde::Deserialize;

/// One row of the daily billing export.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageRecord {
    #[serde(rename = "OrganizationID")]
    pub organization_id: String,
    /// Kept as raw text; the metrics calculator coerces it to a number and
    /// treats anything non-numeric as zero.
    #[serde(rename = "Total")]
    pub total: String,
}

/// The parsed billing export for one day. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct UsageReport {
    pub records: Vec<UsageRecord>,
}

impl UsageReport {
    pub fn new(records: Vec<UsageRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Org ids are compared trimmed and lowercased everywhere.
pub fn normalize_org_id(id: &str) -> String {
    id.trim().to_lowercase()
}
