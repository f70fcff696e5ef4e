//! Rate graph capability shared by all implementations.

use ratemesh_common::{Currency, Factor, Rate};

use crate::error::GraphResult;

/// A directed graph of exchange rates answering best-factor queries.
///
/// `insert_edge(a, b, w)` installs `a -> b = w` and `b -> a = 1 / w`.
/// `best_factor(a, b)` is the number of `b` units one unit of `a` buys
/// along the most favourable known chain of rates.
pub trait RateGraph: Send + Sync {
    /// Publish a rate, replacing any previous rate for the same pair.
    fn insert_edge(&self, base: &Currency, quote: &Currency, rate: Rate) -> InsertOutcome;

    /// Best known conversion factor from `from` to `to`.
    ///
    /// Fails with `VertexNotFound` for an unknown currency (checking `from`
    /// first) and with `PathNotFound` when both are known but disconnected.
    fn best_factor(&self, from: &Currency, to: &Currency) -> GraphResult<Factor>;

    /// Whether the currency appeared in any published rate.
    fn contains_vertex(&self, currency: &Currency) -> bool;
}

/// What an edge insertion changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The edge already held a numerically equal rate, or base == quote.
    Unchanged,
    /// The edge was written; `paths_updated` cached pairs were created or improved.
    Updated { paths_updated: usize },
}

/// Cached best path between two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEntry {
    /// Composite conversion factor.
    pub factor: Factor,
    /// Number of published rates chained to obtain the factor.
    pub hops: u32,
}

impl PathEntry {
    /// Path from a currency to itself.
    pub fn identity() -> Self {
        Self {
            factor: Factor::ONE,
            hops: 0,
        }
    }
}
