//! Conversion service over the rate graph.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use ratemesh_common::{parse_decimal, round_output, Currency, CurrencyPair, Rate};
use ratemesh_graph::{IncrementalRateGraph, InsertOutcome, RateGraph};

use crate::error::{FxError, FxResult};

/// Publishes rates into the graph and converts amounts through it.
pub struct ConversionService {
    graph: Arc<dyn RateGraph>,
}

impl ConversionService {
    /// Create a service backed by an empty incremental graph.
    pub fn new() -> Self {
        Self::with_graph(Arc::new(IncrementalRateGraph::new()))
    }

    /// Create a service over an existing graph.
    pub fn with_graph(graph: Arc<dyn RateGraph>) -> Self {
        Self { graph }
    }

    /// Publish `1 base = price quote`, decoding the price from its
    /// external representation.
    pub fn add_rate(&self, base: &str, quote: &str, price: &str) -> FxResult<()> {
        let rate = Rate::parse(price)?;
        self.publish(CurrencyPair::new(base, quote), rate)
    }

    /// Publish an already decoded price.
    pub fn add_rate_decimal(&self, base: &str, quote: &str, price: Decimal) -> FxResult<()> {
        let rate = Rate::new(price)?;
        self.publish(CurrencyPair::new(base, quote), rate)
    }

    #[instrument(skip_all, fields(pair = %pair, rate = %rate))]
    fn publish(&self, pair: CurrencyPair, rate: Rate) -> FxResult<()> {
        if pair.is_identity() {
            return Err(FxError::InvalidInput(format!(
                "Base and quote currency must differ, got {}",
                pair
            )));
        }

        match self.graph.insert_edge(&pair.base, &pair.quote, rate) {
            InsertOutcome::Updated { paths_updated } => {
                info!(paths_updated, "Rate published");
            }
            InsertOutcome::Unchanged => {
                debug!("Rate already published");
            }
        }

        Ok(())
    }

    /// Convert `amount` units of `from` into `to`, rounded half-up to 4
    /// fractional digits.
    #[instrument(skip_all, fields(from = %from, to = %to, amount = %amount))]
    pub fn convert(&self, from: &str, to: &str, amount: Decimal) -> FxResult<Decimal> {
        let from = Currency::new(from);
        let to = Currency::new(to);

        let factor = self.graph.best_factor(&from, &to)?;
        let converted = factor
            .apply(amount)
            .ok_or_else(|| FxError::ArithmeticOverflow {
                from: from.clone(),
                to: to.clone(),
                amount,
            })?;
        let output = round_output(converted);

        debug!(factor = %factor, output = %output, "Conversion completed");
        Ok(output)
    }

    /// Convert an amount given in its external representation and render
    /// the result with exactly 4 fractional digits.
    pub fn convert_str(&self, from: &str, to: &str, amount: &str) -> FxResult<String> {
        let amount = parse_decimal(amount)?;
        self.convert(from, to, amount).map(|output| output.to_string())
    }

    /// Whether the currency appeared in any published rate.
    pub fn is_known(&self, currency: &str) -> bool {
        self.graph.contains_vertex(&Currency::new(currency))
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}
