use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Company, UsageMetrics};

const DEFAULT_API_BASE: &str = "https://api.planhat.com";
const DEFAULT_ANALYTICS_BASE: &str = "https://analytics.planhat.com";

pub const DIMENSION_CUMULATIVE: &str = "Cumulative Billable CPUs";
pub const DIMENSION_FORECASTED: &str = "Forecasted Billable CPUs";

/// Planhat REST client: roster reads against the core API, dimension-data
/// writes against the analytics API. Bearer auth on both.
#[derive(Clone)]
pub struct PlanhatClient {
    http: reqwest::Client,
    api_base: String,
    analytics_base: String,
    api_token: String,
}

/// Raw company shape returned by `GET /companies`.
#[derive(Debug, Deserialize)]
struct CompanyRaw {
    #[serde(rename = "_id", default)]
    id: String,
    name: Option<String>,
    #[serde(default)]
    custom: serde_json::Value,
}

impl CompanyRaw {
    fn into_company(self) -> Company {
        // "Org ID" is a free-form custom field; numbers show up in practice.
        let org_id = match self.custom.get("Org ID") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Company {
            planhat_id: self.id,
            org_id,
            name: self.name.unwrap_or_default(),
        }
    }
}

/// One time-series point for `POST /dimensiondata/{tenant}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDataPoint {
    pub dimension_id: String,
    pub value: f64,
    pub external_id: String,
    pub model: String,
    pub date: String,
}

impl PlanhatClient {
    pub fn new(api_token: String) -> Self {
        Self::with_base_urls(
            api_token,
            DEFAULT_API_BASE.to_string(),
            DEFAULT_ANALYTICS_BASE.to_string(),
        )
    }

    /// Base-url override, used by tests against a local mock server.
    pub fn with_base_urls(api_token: String, api_base: String, analytics_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            analytics_base,
            api_token,
        }
    }

    /// Fetches a single batch of companies, at most `limit`.
    ///
    /// One bounded page only, offset 0: rosters larger than `limit` are
    /// silently truncated. Any failure is logged and collapses to `None`.
    pub async fn fetch_companies(&self, limit: u32) -> Option<Vec<Company>> {
        tracing::info!("Fetching a single batch of companies from Planhat...");
        match self.try_fetch_companies(limit).await {
            Ok(companies) => {
                tracing::info!("Successfully fetched {} companies", companies.len());
                Some(companies)
            }
            Err(e) => {
                tracing::error!("Error fetching companies from Planhat: {}", e);
                None
            }
        }
    }

    async fn try_fetch_companies(&self, limit: u32) -> AppResult<Vec<Company>> {
        let url = format!("{}/companies", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("offset", "0".to_string()), ("limit", limit.to_string())])
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let raw: Vec<CompanyRaw> = response.json().await?;
        Ok(raw.into_iter().map(CompanyRaw::into_company).collect())
    }

    /// Pushes both metric points for one company as a single request.
    ///
    /// Failures are logged and swallowed; one bad company must not abort
    /// the batch.
    pub async fn publish_company_metrics(
        &self,
        tenant_id: &str,
        company: &Company,
        org_id: &str,
        date_str: &str,
        metrics: UsageMetrics,
    ) {
        tracing::info!("Updating Planhat for Company Name: {}", company.name);
        match self.try_publish(tenant_id, org_id, date_str, metrics).await {
            Ok(()) => tracing::info!(
                "Planhat updated successfully for Company Name: {}",
                company.name
            ),
            Err(e) => tracing::error!(
                "Error updating Planhat for Company Name: {}, {}",
                company.name,
                e
            ),
        }
    }

    async fn try_publish(
        &self,
        tenant_id: &str,
        org_id: &str,
        date_str: &str,
        metrics: UsageMetrics,
    ) -> AppResult<()> {
        let points = build_dimension_points(org_id, date_str, metrics)?;
        let url = format!("{}/dimensiondata/{}", self.analytics_base, tenant_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&points)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// Builds the cumulative and forecasted points for one company. The upload
/// date round-trips through a parse so malformed date strings are rejected
/// before anything is sent.
pub fn build_dimension_points(
    org_id: &str,
    date_str: &str,
    metrics: UsageMetrics,
) -> AppResult<Vec<DimensionDataPoint>> {
    let upload_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| AppError::InvalidInput(format!("Bad metric date '{}': {}", date_str, e)))?;
    let date = upload_date.format("%Y-%m-%d").to_string();

    Ok(vec![
        DimensionDataPoint {
            dimension_id: DIMENSION_CUMULATIVE.to_string(),
            value: metrics.cumulative,
            external_id: org_id.to_string(),
            model: "Asset".to_string(),
            date: date.clone(),
        },
        DimensionDataPoint {
            dimension_id: DIMENSION_FORECASTED.to_string(),
            value: metrics.forecasted,
            external_id: org_id.to_string(),
            model: "Asset".to_string(),
            date,
        },
    ])
}

async fn ensure_success(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Api {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn company(org_id: Option<&str>) -> Company {
        Company {
            planhat_id: "ph-1".to_string(),
            org_id: org_id.map(str::to_string),
            name: "Acme".to_string(),
        }
    }

    fn client(server: &MockServer) -> PlanhatClient {
        PlanhatClient::with_base_urls("token-123".to_string(), server.uri(), server.uri())
    }

    #[test]
    fn test_build_dimension_points() {
        let metrics = UsageMetrics {
            cumulative: 150.0,
            forecasted: 450.0,
        };
        let points = build_dimension_points("org1", "2024-03-14", metrics).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].dimension_id, DIMENSION_CUMULATIVE);
        assert_eq!(points[0].value, 150.0);
        assert_eq!(points[1].dimension_id, DIMENSION_FORECASTED);
        assert_eq!(points[1].value, 450.0);
        for point in &points {
            assert_eq!(point.external_id, "org1");
            assert_eq!(point.model, "Asset");
            assert_eq!(point.date, "2024-03-14");
        }
    }

    #[test]
    fn test_build_dimension_points_rejects_bad_date() {
        let metrics = UsageMetrics {
            cumulative: 0.0,
            forecasted: 0.0,
        };
        assert!(build_dimension_points("org1", "14/03/2024", metrics).is_err());
    }

    #[test]
    fn test_dimension_point_wire_format() {
        let point = DimensionDataPoint {
            dimension_id: DIMENSION_CUMULATIVE.to_string(),
            value: 1.5,
            external_id: "org1".to_string(),
            model: "Asset".to_string(),
            date: "2024-03-14".to_string(),
        };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(
            value,
            json!({
                "dimensionId": "Cumulative Billable CPUs",
                "value": 1.5,
                "externalId": "org1",
                "model": "Asset",
                "date": "2024-03-14"
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_companies_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/companies"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "500"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"_id": "ph-1", "name": "Acme", "custom": {"Org ID": "org1"}},
                {"_id": "ph-2", "name": "NoCustom"},
                {"_id": "ph-3", "name": "NumericOrg", "custom": {"Org ID": 42}},
            ])))
            .mount(&server)
            .await;

        let companies = client(&server).fetch_companies(500).await.unwrap();

        assert_eq!(companies.len(), 3);
        assert_eq!(
            companies[0],
            Company {
                planhat_id: "ph-1".to_string(),
                org_id: Some("org1".to_string()),
                name: "Acme".to_string(),
            }
        );
        assert_eq!(companies[1].org_id, None);
        assert_eq!(companies[2].org_id, Some("42".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_companies_non_2xx_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/companies"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(client(&server).fetch_companies(500).await.is_none());
    }

    #[tokio::test]
    async fn test_publish_posts_both_points_in_one_request() {
        let server = MockServer::start().await;
        let metrics = UsageMetrics {
            cumulative: 150.0,
            forecasted: 450.0,
        };
        Mock::given(method("POST"))
            .and(path("/dimensiondata/tenant-1"))
            .and(header("authorization", "Bearer token-123"))
            .and(body_json(json!([
                {
                    "dimensionId": "Cumulative Billable CPUs",
                    "value": 150.0,
                    "externalId": "org1",
                    "model": "Asset",
                    "date": "2024-03-14"
                },
                {
                    "dimensionId": "Forecasted Billable CPUs",
                    "value": 450.0,
                    "externalId": "org1",
                    "model": "Asset",
                    "date": "2024-03-14"
                }
            ])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .publish_company_metrics("tenant-1", &company(Some("org1")), "org1", "2024-03-14", metrics)
            .await;
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let metrics = UsageMetrics {
            cumulative: 1.0,
            forecasted: 2.0,
        };
        // Must not panic or propagate.
        client(&server)
            .publish_company_metrics("tenant-1", &company(Some("org1")), "org1", "2024-03-14", metrics)
            .await;
    }
}
