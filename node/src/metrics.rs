//! Request counters for node monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ratemesh_protocol::{Response, StatusCode};

/// Node metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Requests decoded or rejected as malformed.
    pub requests_total: AtomicU64,
    /// Rates accepted.
    pub publishes_accepted: AtomicU64,
    /// Conversions answered.
    pub conversions_completed: AtomicU64,
    /// Requests answered with `NOT_FOUND`.
    pub not_found: AtomicU64,
    /// Requests answered with `INVALID_ARGUMENT`.
    pub invalid_arguments: AtomicU64,
    /// Requests answered with `INTERNAL`.
    pub internal_errors: AtomicU64,
    /// Open connections.
    pub connections_active: AtomicU64,
    /// Connections refused because the limit was reached.
    pub connections_rejected: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a response by its outcome.
    pub fn record(&self, response: &Response) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let counter = match response {
            Response::Published => &self.publishes_accepted,
            Response::Converted(_) => &self.conversions_completed,
            Response::Error { status, .. } => match status {
                StatusCode::NotFound => &self.not_found,
                StatusCode::InvalidArgument => &self.invalid_arguments,
                StatusCode::Ok | StatusCode::Internal => &self.internal_errors,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted connection.
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection.
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a refused connection.
    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            publishes_accepted: self.publishes_accepted.load(Ordering::Relaxed),
            conversions_completed: self.conversions_completed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            invalid_arguments: self.invalid_arguments.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub publishes_accepted: u64,
    pub conversions_completed: u64,
    pub not_found: u64,
    pub invalid_arguments: u64,
    pub internal_errors: u64,
    pub connections_active: u64,
    pub connections_rejected: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_by_outcome() {
        let metrics = Metrics::new();

        metrics.record(&Response::Published);
        metrics.record(&Response::converted("1.0000"));
        metrics.record(&Response::error(StatusCode::NotFound, "Currency test was not found"));
        metrics.record(&Response::error(StatusCode::InvalidArgument, "bad price"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 4);
        assert_eq!(snapshot.publishes_accepted, 1);
        assert_eq!(snapshot.conversions_completed, 1);
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.invalid_arguments, 1);
        assert_eq!(snapshot.internal_errors, 0);
    }

    #[test]
    fn test_connection_gauge() {
        let metrics = Metrics::new();
        metrics.connection_opened();
        metrics.connection_opened();
        metrics.connection_closed();
        metrics.connection_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_active, 1);
        assert_eq!(snapshot.connections_rejected, 1);
    }
}
