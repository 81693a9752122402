use std::env;

use crate::error::{AppError, AppResult};
use crate::models::OrgAliasSets;

#[derive(Clone, Debug)]
pub struct Config {
    pub bucket_name: String,
    pub service_account_json: String,
    pub planhat_api_token: String,
    pub planhat_tenant_id: String,
    pub company_limit: u32,
    pub org_alias_sets: OrgAliasSets,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let org_alias_sets = match env::var("ORG_ID_ALIAS_SETS") {
            Ok(raw) => OrgAliasSets::from_json(&raw)?,
            Err(_) => OrgAliasSets::default(),
        };

        Ok(Config {
            bucket_name: require("BILLING_BUCKET_NAME")?,
            service_account_json: require("GCP_SERVICE_ACCOUNT_JSON")?,
            planhat_api_token: require("PLANHAT_API_TOKEN")?,
            planhat_tenant_id: require("PLANHAT_TENANT_ID")?,
            company_limit: env::var("PLANHAT_COMPANY_LIMIT")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
            org_alias_sets,
        })
    }
}

/// Required variable; blank counts as unset.
fn require(name: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!("{} is not set", name))),
    }
}
