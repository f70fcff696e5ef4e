//! Simulation metrics.

use std::collections::VecDeque;

/// Simulation metrics.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Rates published.
    pub publishes: u64,
    /// Conversions that produced an amount.
    pub conversions: u64,
    /// Conversions that failed with a not-found outcome.
    pub failures: u64,
    /// Results that disagreed with what was expected.
    pub mismatches: u64,
    /// Conversion latency samples (µs).
    latency_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            publishes: 0,
            conversions: 0,
            failures: 0,
            mismatches: 0,
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record a published rate.
    pub fn record_publish(&mut self) {
        self.publishes += 1;
    }

    /// Record a successful conversion.
    pub fn record_conversion(&mut self, latency_us: u64) {
        self.conversions += 1;
        self.push_sample(latency_us);
    }

    /// Record a not-found conversion.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Record a result that contradicts the expectation.
    pub fn record_mismatch(&mut self) {
        self.mismatches += 1;
    }

    /// Fold in metrics gathered by another worker.
    pub fn merge(&mut self, other: &SimulationMetrics) {
        self.publishes += other.publishes;
        self.conversions += other.conversions;
        self.failures += other.failures;
        self.mismatches += other.mismatches;
        for &sample in &other.latency_samples {
            self.push_sample(sample);
        }
    }

    fn push_sample(&mut self, latency_us: u64) {
        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_us);
    }

    /// Get average conversion latency in µs.
    pub fn average_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p99 conversion latency in µs.
    pub fn p99_latency_us(&self) -> u64 {
        self.percentile_latency(99)
    }

    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
