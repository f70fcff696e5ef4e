//! Simulation controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{info, warn};

use ratemesh_common::{Currency, Factor, Rate};
use ratemesh_fx::ConversionService;
use ratemesh_graph::{BruteForceRateGraph, IncrementalRateGraph, RateGraph};

use crate::metrics::SimulationMetrics;
use crate::scenario::{Expectation, Scenario, ScenarioStep};

/// Settings of the concurrent load scenario.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Currencies in the random rate tree.
    pub currencies: usize,
    /// Writer threads, and as many reader threads.
    pub threads: usize,
    /// Compare every pair against the brute-force baseline afterwards.
    pub verify: bool,
}

/// A published rate of the generated tree.
#[derive(Debug, Clone)]
struct RateEdge {
    base: String,
    quote: String,
    price: Decimal,
}

/// Controls the simulation.
pub struct SimulationController {
    /// Random number generator.
    rng: StdRng,
    /// Simulation metrics.
    metrics: SimulationMetrics,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            metrics: SimulationMetrics::new(),
        }
    }

    /// Metrics gathered so far.
    pub fn get_metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Replay a scenario against a fresh service.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        let service = ConversionService::new();
        for step in &scenario.steps {
            self.execute_step(&service, step)?;
        }

        Ok(())
    }

    fn execute_step(&mut self, service: &ConversionService, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Publish { base, quote, price } => {
                service.add_rate(base, quote, price)?;
                self.metrics.record_publish();
            }
            ScenarioStep::Convert {
                from,
                to,
                amount,
                expect,
            } => {
                let start = Instant::now();
                let outcome = service.convert_str(from, to, amount);
                let latency_us = start.elapsed().as_micros() as u64;

                match (outcome, expect) {
                    (Ok(price), Expectation::Price(expected)) if price == *expected => {
                        self.metrics.record_conversion(latency_us);
                    }
                    (Err(err), Expectation::NotFound) if err.is_not_found() => {
                        self.metrics.record_failure();
                    }
                    (outcome, expected) => {
                        warn!(
                            from = %from,
                            to = %to,
                            amount = %amount,
                            outcome = ?outcome,
                            expected = ?expected,
                            "Unexpected conversion result"
                        );
                        self.metrics.record_mismatch();
                    }
                }
            }
        }

        Ok(())
    }

    /// Publish a random rate tree from several writers while readers convert
    /// and check that forward and reverse factors stay reciprocal.
    pub async fn run_concurrent(&mut self, load: &LoadConfig) -> anyhow::Result<()> {
        if load.currencies < 2 {
            anyhow::bail!("At least 2 currencies are required, got {}", load.currencies);
        }
        let threads = load.threads.max(1);

        let currencies: Vec<String> = (0..load.currencies).map(|i| format!("C{i:03}")).collect();
        let edges = self.random_tree(&currencies);
        info!(
            currencies = currencies.len(),
            rates = edges.len(),
            threads,
            "Running concurrent scenario"
        );

        let graph = Arc::new(IncrementalRateGraph::new());
        let service = Arc::new(ConversionService::with_graph(graph.clone()));
        let currencies = Arc::new(currencies);
        let done = Arc::new(AtomicBool::new(false));
        let started = Instant::now();

        let mut writers = Vec::with_capacity(threads);
        for chunk in edges.chunks(edges.len().div_ceil(threads)) {
            let chunk = chunk.to_vec();
            let service = service.clone();
            writers.push(tokio::task::spawn_blocking(move || publish_all(&service, &chunk)));
        }

        let mut readers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let seed = self.rng.gen();
            let graph = graph.clone();
            let service = service.clone();
            let currencies = currencies.clone();
            let done = done.clone();
            readers.push(tokio::task::spawn_blocking(move || {
                convert_until(&graph, &service, &currencies, &done, seed)
            }));
        }

        let mut result = Ok(());
        for writer in writers {
            match writer.await? {
                Ok(metrics) => self.metrics.merge(&metrics),
                Err(err) => result = Err(err),
            }
        }
        done.store(true, Ordering::Release);
        for reader in readers {
            self.metrics.merge(&reader.await?);
        }
        result?;

        let expected_paths = currencies.len() * (currencies.len() - 1) / 2;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            paths = graph.path_count(),
            "Concurrent publishing finished"
        );
        if graph.path_count() != expected_paths {
            warn!(
                paths = graph.path_count(),
                expected = expected_paths,
                "Rate tree is not fully connected"
            );
            self.metrics.record_mismatch();
        }

        if load.verify {
            self.verify_against_baseline(&graph, &edges)?;
        }

        Ok(())
    }

    /// Random spanning tree over `currencies` with rates in `[0.5, 2)`.
    fn random_tree(&mut self, currencies: &[String]) -> Vec<RateEdge> {
        let mut edges: Vec<RateEdge> = (1..currencies.len())
            .map(|child| {
                let parent = self.rng.gen_range(0..child);
                let price = Decimal::new(self.rng.gen_range(5_000..20_000), 4);
                let (base, quote) = if self.rng.gen_bool(0.5) {
                    (child, parent)
                } else {
                    (parent, child)
                };

                RateEdge {
                    base: currencies[base].clone(),
                    quote: currencies[quote].clone(),
                    price,
                }
            })
            .collect();

        edges.shuffle(&mut self.rng);
        edges
    }

    fn verify_against_baseline(
        &mut self,
        graph: &IncrementalRateGraph,
        edges: &[RateEdge],
    ) -> anyhow::Result<()> {
        let baseline = BruteForceRateGraph::new();
        for edge in edges {
            baseline.insert_edge(
                &Currency::new(edge.base.as_str()),
                &Currency::new(edge.quote.as_str()),
                Rate::new(edge.price)?,
            );
        }

        let currencies = graph.currencies();
        let mut checked = 0usize;
        for from in &currencies {
            for to in &currencies {
                match (graph.best_factor(from, to), baseline.best_factor(from, to)) {
                    (Ok(fast), Ok(slow)) if close(fast, slow) => checked += 1,
                    (fast, slow) => {
                        warn!(
                            from = %from,
                            to = %to,
                            incremental = ?fast,
                            baseline = ?slow,
                            "Mismatch against baseline"
                        );
                        self.metrics.record_mismatch();
                    }
                }
            }
        }

        info!(pairs = checked, "Baseline verification finished");
        Ok(())
    }
}

/// Relative tolerance for comparing factors computed along different routes.
fn tolerance() -> Decimal {
    Decimal::new(1, 9)
}

fn close(left: Factor, right: Factor) -> bool {
    left.compose(right.recip())
        .to_decimal()
        .map_or(false, |ratio| (ratio - Decimal::ONE).abs() <= tolerance())
}

fn publish_all(service: &ConversionService, edges: &[RateEdge]) -> anyhow::Result<SimulationMetrics> {
    let mut metrics = SimulationMetrics::new();
    for edge in edges {
        service.add_rate_decimal(&edge.base, &edge.quote, edge.price)?;
        metrics.record_publish();
    }
    Ok(metrics)
}

fn convert_until(
    graph: &IncrementalRateGraph,
    service: &ConversionService,
    currencies: &[String],
    done: &AtomicBool,
    seed: u64,
) -> SimulationMetrics {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut metrics = SimulationMetrics::new();

    while !done.load(Ordering::Acquire) {
        let from = &currencies[rng.gen_range(0..currencies.len())];
        let to = &currencies[rng.gen_range(0..currencies.len())];

        let start = Instant::now();
        match service.convert(from, to, Decimal::ONE) {
            Ok(_) => metrics.record_conversion(start.elapsed().as_micros() as u64),
            // the tree is still being published
            Err(err) if err.is_not_found() => metrics.record_failure(),
            Err(err) => {
                warn!(from = %from, to = %to, error = %err, "Conversion failed");
                metrics.record_mismatch();
            }
        }

        let pair = graph.path_pair(&Currency::new(from.as_str()), &Currency::new(to.as_str()));
        if let Ok((forward, reverse)) = pair {
            let symmetric =
                forward.hops == reverse.hops && close(forward.factor.compose(reverse.factor), Factor::ONE);
            if !symmetric {
                warn!(
                    from = %from,
                    to = %to,
                    forward = %forward.factor,
                    reverse = %reverse.factor,
                    "Asymmetric path pair"
                );
                metrics.record_mismatch();
            }
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_scenarios_match() {
        for name in Scenario::BUILT_IN {
            let mut controller = SimulationController::new(Some(7));
            controller.run_scenario(&Scenario::load(name).unwrap()).unwrap();

            let metrics = controller.get_metrics();
            assert_eq!(metrics.mismatches, 0, "{name}");
            assert_eq!(metrics.conversions, 8, "{name}");
            assert_eq!(metrics.failures, 4, "{name}");
        }
    }

    #[test]
    fn test_wrong_expectation_is_a_mismatch() {
        let scenario = Scenario {
            name: "wrong".to_string(),
            description: String::new(),
            steps: vec![
                ScenarioStep::Publish {
                    base: "AAA".to_string(),
                    quote: "BBB".to_string(),
                    price: "2".to_string(),
                },
                ScenarioStep::Convert {
                    from: "AAA".to_string(),
                    to: "BBB".to_string(),
                    amount: "1".to_string(),
                    expect: Expectation::NotFound,
                },
            ],
        };

        let mut controller = SimulationController::new(None);
        controller.run_scenario(&scenario).unwrap();
        assert_eq!(controller.get_metrics().mismatches, 1);
    }

    #[test]
    fn test_random_tree_spans_all_currencies() {
        let mut controller = SimulationController::new(Some(42));
        let currencies: Vec<String> = (0..10).map(|i| format!("C{i}")).collect();
        let edges = controller.random_tree(&currencies);

        assert_eq!(edges.len(), 9);
        for edge in &edges {
            assert_ne!(edge.base, edge.quote);
            assert!(edge.price >= Decimal::new(5, 1) && edge.price < Decimal::TWO);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_scenario_verifies() {
        let mut controller = SimulationController::new(Some(1));
        let load = LoadConfig {
            currencies: 12,
            threads: 3,
            verify: true,
        };

        controller.run_concurrent(&load).await.unwrap();

        let metrics = controller.get_metrics();
        assert_eq!(metrics.publishes, 11);
        assert_eq!(metrics.mismatches, 0);
    }

    #[tokio::test]
    async fn test_concurrent_scenario_needs_two_currencies() {
        let mut controller = SimulationController::new(Some(1));
        let load = LoadConfig {
            currencies: 1,
            threads: 1,
            verify: false,
        };
        assert!(controller.run_concurrent(&load).await.is_err());
    }
}
