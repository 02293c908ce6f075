//! Plain data row types written by output backends.

/// Summary of the population at the end of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummaryRow {
    pub tick:           u64,
    pub unix_time_secs: i64,
    pub population:     u64,
    /// `("<column>.<value>", count)` for every tracked column value, in
    /// tracking order.
    pub counts:         Vec<(String, u64)>,
}

/// One named metric at the end of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub tick:  u64,
    pub name:  String,
    pub value: f64,
}
