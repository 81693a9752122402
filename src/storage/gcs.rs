use google_cloud_storage::{
    client::{google_cloud_auth::credentials::CredentialsFile, Client, ClientConfig},
    http::objects::{download::Range, get::GetObjectRequest, list::ListObjectsRequest},
};

use crate::error::{AppError, AppResult};

use super::ObjectStore;

pub struct GcsBackend {
    client: Client,
    bucket: String,
}

impl GcsBackend {
    /// Builds a client from a service-account JSON blob (the credential
    /// itself, not a path to one).
    pub async fn new(bucket: String, service_account_json: &str) -> AppResult<Self> {
        let credentials = CredentialsFile::new_from_str(service_account_json)
            .await
            .map_err(|e| AppError::Storage(format!("GCS credentials invalid: {}", e)))?;
        let config = ClientConfig::default()
            .with_credentials(credentials)
            .await
            .map_err(|e| AppError::Storage(format!("GCS auth failed: {}", e)))?;
        let client = Client::new(config);
        Ok(Self { client, bucket })
    }
}

#[async_trait::async_trait]
impl ObjectStore for GcsBackend {
    async fn list_objects(&self) -> AppResult<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects(&ListObjectsRequest {
                    bucket: self.bucket.clone(),
                    page_token: page_token.clone(),
                    ..Default::default()
                })
                .await
                .map_err(|e| AppError::Storage(format!("GCS list failed: {}", e)))?;

            names.extend(response.items.unwrap_or_default().into_iter().map(|o| o.name));

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        tracing::info!("GCS list: bucket={}, objects={}", self.bucket, names.len());
        Ok(names)
    }

    async fn download(&self, key: &str) -> AppResult<Vec<u8>> {
        let data = self
            .client
            .download_object(
                &GetObjectRequest {
                    bucket: self.bucket.clone(),
                    object: key.to_string(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| AppError::Storage(format!("GCS download failed: {}", e)))?;

        tracing::info!(
            "GCS download: bucket={}, key={}, size={}",
            self.bucket,
            key,
            data.len()
        );
        Ok(data)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
