use chrono::{Datelike, NaiveDate};

use crate::models::{normalize_org_id, UsageMetrics, UsageReport};

/// Cumulative and forecasted billable CPUs for one set of org ids.
///
/// Sums the month-to-date totals of every row belonging to `org_ids`, then
/// linearly extrapolates that sum over the full month of `reference_date`.
/// A set with no matching rows yields zeros, never an error.
pub fn compute_metrics(
    report: &UsageReport,
    org_ids: &[String],
    reference_date: NaiveDate,
) -> UsageMetrics {
    let org_ids: Vec<String> = org_ids.iter().map(|id| normalize_org_id(id)).collect();

    let cumulative: f64 = report
        .records
        .iter()
        .filter(|r| org_ids.contains(&normalize_org_id(&r.organization_id)))
        .map(|r| coerce_total(&r.total))
        .sum();

    // day() is 1-based, so the guard never fires for a valid date.
    let days_passed = reference_date.day();
    let average_daily = if days_passed > 0 {
        cumulative / days_passed as f64
    } else {
        0.0
    };
    let forecasted = average_daily * days_in_month(reference_date) as f64;

    UsageMetrics {
        cumulative: round2(cumulative),
        forecasted: round2(forecasted),
    }
}

/// Loose numeric coercion matching the export's typing: anything that does
/// not parse as a number counts as zero. Rows are never dropped.
fn coerce_total(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first = date.with_day(1).unwrap();
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .unwrap();
    (first_of_next - first).num_days() as u32
}

/// Round half away from zero to 2 decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
