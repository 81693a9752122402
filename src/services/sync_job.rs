use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};

use crate::config::Config;
use crate::services::metrics::compute_metrics;
use crate::services::planhat::PlanhatClient;
use crate::services::usage_report::UsageReportSource;
use crate::storage::{GcsBackend, ObjectStore};

/// Overall result of one invocation: a human-readable message plus the
/// HTTP-style status code reported to the invoker. Only configuration and
/// the two upstream fetches can fail the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub message: String,
    pub status_code: u16,
}

impl JobOutcome {
    pub fn success(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status_code: 200,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status_code: 500,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Fixed delay between per-company updates, a courtesy to the analytics API.
const PER_COMPANY_DELAY: Duration = Duration::from_secs(1);

/// The daily sync: billing export -> roster -> per-company metrics -> Planhat.
pub struct SyncJob<S> {
    config: Config,
    usage_source: UsageReportSource<S>,
    planhat: PlanhatClient,
    per_company_delay: Duration,
}

impl<S: ObjectStore> SyncJob<S> {
    pub fn new(config: Config, store: S, planhat: PlanhatClient) -> Self {
        Self {
            config,
            usage_source: UsageReportSource::new(store),
            planhat,
            per_company_delay: PER_COMPANY_DELAY,
        }
    }

    /// Same job, custom pacing. Tests run with a zero delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.per_company_delay = delay;
        self
    }

    /// Runs the sync for the current UTC date.
    pub async fn run(&self) -> JobOutcome {
        self.run_for(Utc::now().date_naive()).await
    }

    /// The export object is named with the day it is delivered
    /// (`execution_date`); the totals inside and the published points belong
    /// to the previous day (`data_date`). Intentional, do not "fix".
    pub async fn run_for(&self, execution_date: NaiveDate) -> JobOutcome {
        let data_date = execution_date - Days::new(1);
        let date_str = data_date.format("%Y-%m-%d").to_string();

        let execution_date_str = execution_date.format("%Y-%m-%d").to_string();
        let report = match self.usage_source.fetch_for_date(&execution_date_str).await {
            Some(report) => report,
            None => {
                tracing::error!("Current day's data not available. Exiting.");
                return JobOutcome::failure("CSV data not available");
            }
        };

        let companies = match self.planhat.fetch_companies(self.config.company_limit).await {
            Some(companies) => companies,
            None => {
                tracing::error!("Failed to fetch companies from Planhat. Exiting.");
                return JobOutcome::failure("Failed to fetch companies");
            }
        };

        for company in &companies {
            let org_id = match company.org_id.as_deref().filter(|id| !id.trim().is_empty()) {
                Some(id) => id,
                None => {
                    tracing::warn!(
                        "Company '{}' does not have an Org ID. Skipping.",
                        company.name
                    );
                    continue;
                }
            };

            let org_ids = self.effective_org_ids(org_id, &company.name);
            let metrics = compute_metrics(&report, &org_ids, data_date);

            tracing::info!("Company: {}", company.name);
            tracing::info!("Date: {}", date_str);
            tracing::info!("Cumulative CPUs: {}", metrics.cumulative);
            tracing::info!("Forecasted CPUs: {}", metrics.forecasted);

            self.planhat
                .publish_company_metrics(
                    &self.config.planhat_tenant_id,
                    company,
                    org_id,
                    &date_str,
                    metrics,
                )
                .await;

            tokio::time::sleep(self.per_company_delay).await;
        }

        tracing::info!("Sync completed successfully.");
        JobOutcome::success("Success")
    }

    /// Alias-set lookup: a company whose org id belongs to a configured set
    /// aggregates every id in that set, otherwise just its own.
    fn effective_org_ids(&self, org_id: &str, company_name: &str) -> Vec<String> {
        match self.config.org_alias_sets.resolve(org_id) {
            Some(set) => {
                let ids: Vec<String> = set.iter().cloned().collect();
                tracing::info!("Company '{}' uses multiple Org IDs: {:?}", company_name, ids);
                ids
            }
            None => {
                tracing::info!("Company '{}' uses single Org ID: {}", company_name, org_id);
                vec![org_id.to_string()]
            }
        }
    }
}

/// Loads configuration from the environment, builds the real clients and
/// runs the job once. All upstream failures collapse to a 500 outcome.
pub async fn run_from_env() -> JobOutcome {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return JobOutcome::failure("Env var configuration error");
        }
    };

    let store =
        match GcsBackend::new(config.bucket_name.clone(), &config.service_account_json).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("Failed to create GCS client: {}", e);
                return JobOutcome::failure("CSV data not available");
            }
        };

    let planhat = PlanhatClient::new(config.planhat_api_token.clone());
    SyncJob::new(config, store, planhat).run().await
}
