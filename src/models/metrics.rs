/// Cumulative and forecasted billable CPUs for one company and one date,
/// both rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageMetrics {
    pub cumulative: f64,
    pub forecasted: f64,
}
