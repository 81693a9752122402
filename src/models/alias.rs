use std::collections::HashSet;

use crate::error::{AppError, AppResult};

use super::usage::normalize_org_id;

/// Groups of org ids that bill as one logical customer (multi-tenant
/// customers with split billing ids).
///
/// Loaded from configuration as a JSON array of arrays, e.g.
/// `[["id-a","id-b"],["id-c","id-d"]]`. Ids are normalized on load so
/// membership checks match the calculator's row filter.
#[derive(Clone, Debug, Default)]
pub struct OrgAliasSets {
    sets: Vec<HashSet<String>>,
}

impl OrgAliasSets {
    pub fn from_json(raw: &str) -> AppResult<Self> {
        let sets: Vec<Vec<String>> = serde_json::from_str(raw).map_err(|e| {
            AppError::Config(format!("ORG_ID_ALIAS_SETS is not a JSON array of arrays: {}", e))
        })?;
        Ok(Self::from_sets(sets))
    }

    pub fn from_sets(sets: Vec<Vec<String>>) -> Self {
        let sets = sets
            .into_iter()
            .map(|ids| ids.iter().map(|id| normalize_org_id(id)).collect())
            .collect();
        Self { sets }
    }

    /// Returns the full alias set containing `org_id`, if any. Membership in
    /// a set means every id in it is aggregated, not just the queried one.
    pub fn resolve(&self, org_id: &str) -> Option<&HashSet<String>> {
        let normalized = normalize_org_id(org_id);
        self.sets.iter().find(|set| set.contains(&normalized))
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
