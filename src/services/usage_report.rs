use crate::error::AppResult;
use crate::models::{UsageRecord, UsageReport};
use crate::storage::ObjectStore;

/// Locates and parses the daily billing export in the bucket.
pub struct UsageReportSource<S> {
    store: S,
}

impl<S: ObjectStore> UsageReportSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Finds the first `.csv` object whose name contains `date_str` and
    /// parses it.
    ///
    /// Every failure (no matching object, bucket missing, access denied,
    /// bad CSV) collapses to a logged `None`; the caller treats that as
    /// "no data for this date" and cannot distinguish the cause.
    pub async fn fetch_for_date(&self, date_str: &str) -> Option<UsageReport> {
        match self.try_fetch_for_date(date_str).await {
            Ok(Some(report)) => Some(report),
            Ok(None) => {
                tracing::warn!("No file found for the date: {}", date_str);
                None
            }
            Err(e) => {
                tracing::error!("Failed to load billing export for {}: {}", date_str, e);
                None
            }
        }
    }

    async fn try_fetch_for_date(&self, date_str: &str) -> AppResult<Option<UsageReport>> {
        tracing::info!(
            "Accessing bucket '{}' for files with date {}",
            self.store.bucket(),
            date_str
        );

        let names = self.store.list_objects().await?;
        // First match wins; no ordering guarantee beyond provider listing order.
        let name = match names
            .iter()
            .find(|n| n.contains(date_str) && n.ends_with(".csv"))
        {
            Some(name) => name,
            None => return Ok(None),
        };

        tracing::info!("Found file: {}", name);
        let bytes = self.store.download(name).await?;
        let report = parse_usage_csv(&bytes)?;
        tracing::info!("File processed successfully in memory: {} rows", report.len());
        Ok(Some(report))
    }
}

/// Parses a headered billing CSV. `OrganizationID` and `Total` columns are
/// required; any other columns are ignored.
pub fn parse_usage_csv(bytes: &[u8]) -> AppResult<UsageReport> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut records = Vec::new();
    for row in reader.deserialize::<UsageRecord>() {
        records.push(row?);
    }
    Ok(UsageReport::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;

    struct MemoryStore {
        objects: HashMap<String, Vec<u8>>,
        fail_list: bool,
    }

    impl MemoryStore {
        fn new(objects: Vec<(&str, &str)>) -> Self {
            Self {
                objects: objects
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                    .collect(),
                fail_list: false,
            }
        }

        fn failing() -> Self {
            Self {
                objects: HashMap::new(),
                fail_list: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for MemoryStore {
        async fn list_objects(&self) -> AppResult<Vec<String>> {
            if self.fail_list {
                return Err(AppError::Storage("access denied".to_string()));
            }
            let mut names: Vec<String> = self.objects.keys().cloned().collect();
            names.sort();
            Ok(names)
        }

        async fn download(&self, key: &str) -> AppResult<Vec<u8>> {
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::Storage(format!("no such object: {}", key)))
        }

        fn bucket(&self) -> &str {
            "test-bucket"
        }
    }

    const CSV: &str = "OrganizationID,Total\norg1,100\norg2,50\n";

    #[tokio::test]
    async fn test_fetch_matches_date_and_extension() {
        let source = UsageReportSource::new(MemoryStore::new(vec![
            ("billing-2024-03-14.csv", "OrganizationID,Total\nold,1\n"),
            ("billing-2024-03-15.json", "{}"),
            ("billing-2024-03-15.csv", CSV),
        ]));

        let report = source.fetch_for_date("2024-03-15").await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.records[0].organization_id, "org1");
        assert_eq!(report.records[0].total, "100");
    }

    #[tokio::test]
    async fn test_fetch_no_match_returns_none() {
        let source = UsageReportSource::new(MemoryStore::new(vec![
            // Right date, wrong extension; right extension, wrong date.
            ("billing-2024-03-15.json", "{}"),
            ("billing-2024-03-14.csv", CSV),
        ]));

        assert!(source.fetch_for_date("2024-03-15").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_provider_error_collapses_to_none() {
        let source = UsageReportSource::new(MemoryStore::failing());
        assert!(source.fetch_for_date("2024-03-15").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_bad_csv_collapses_to_none() {
        let source = UsageReportSource::new(MemoryStore::new(vec![(
            "billing-2024-03-15.csv",
            "WrongColumn,Other\na,b\n",
        )]));

        assert!(source.fetch_for_date("2024-03-15").await.is_none());
    }

    #[test]
    fn test_parse_keeps_non_numeric_totals_raw() {
        let report =
            parse_usage_csv(b"OrganizationID,Total\norg1,100\norg1,oops\norg1,50\n").unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.records[1].total, "oops");
    }

    #[test]
    fn test_parse_ignores_extra_columns() {
        let report =
            parse_usage_csv(b"Region,OrganizationID,Total\neu,org1,100\n").unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.records[0].organization_id, "org1");
    }

    #[test]
    fn test_parse_missing_column_is_an_error() {
        assert!(parse_usage_csv(b"OrganizationID\norg1\n").is_err());
    }
}
