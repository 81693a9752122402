// Storage abstraction over the bucket holding the daily billing exports

pub mod gcs;

pub use gcs::GcsBackend;

use crate::error::AppResult;

/// Read-only view of the billing export bucket.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// List object names in the bucket, in provider listing order.
    async fn list_objects(&self) -> AppResult<Vec<String>>;

    /// Download one object fully into memory.
    async fn download(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Bucket name.
    fn bucket(&self) -> &str;
}
