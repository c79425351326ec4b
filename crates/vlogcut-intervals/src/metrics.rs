//! Selection metrics.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const ORACLE_FALLBACKS_TOTAL: &str = "vlogcut_oracle_fallbacks_total";
    pub const DESCRIPTIONS_FALLBACK_TOTAL: &str = "vlogcut_description_fallbacks_total";
}

/// Record a source whose intervals came from the fallback heuristic.
pub fn record_oracle_fallback(reason: &'static str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::ORACLE_FALLBACKS_TOTAL, &labels).increment(1);
}

/// Record an interval whose caption could not be generated.
pub fn record_description_fallback() {
    counter!(names::DESCRIPTIONS_FALLBACK_TOTAL).increment(1);
}
