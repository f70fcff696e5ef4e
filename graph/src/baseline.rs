//! Brute-force rate graph used to verify the incremental table.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use ratemesh_common::{Currency, Factor, Rate};

use crate::error::{GraphError, GraphResult};
use crate::graph::{InsertOutcome, RateGraph};

type Edges = HashMap<Currency, HashMap<Currency, Factor>>;

/// Rate graph that stores only edges and searches every simple path on
/// each query.
///
/// Exponential in the worst case; meant for small graphs in tests and the
/// simulator. On rate sets where every route between two currencies yields
/// the same factor it agrees with
/// [`IncrementalRateGraph`](crate::IncrementalRateGraph) up to rounding.
pub struct BruteForceRateGraph {
    edges: RwLock<Edges>,
}

impl BruteForceRateGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            edges: RwLock::new(HashMap::new()),
        }
    }

    fn search<'a>(
        edges: &'a Edges,
        current: &'a Currency,
        target: &Currency,
        factor: Factor,
        visited: &mut HashSet<&'a Currency>,
        best: &mut Option<Factor>,
    ) {
        if current == target {
            if best.map_or(true, |b| factor > b) {
                *best = Some(factor);
            }
            return;
        }

        let Some(neighbours) = edges.get(current) else {
            return;
        };

        for (next, weight) in neighbours {
            if visited.contains(next) {
                continue;
            }
            visited.insert(next);
            Self::search(edges, next, target, factor.compose(*weight), visited, best);
            visited.remove(next);
        }
    }
}

impl Default for BruteForceRateGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RateGraph for BruteForceRateGraph {
    fn insert_edge(&self, base: &Currency, quote: &Currency, rate: Rate) -> InsertOutcome {
        let mut edges = self.edges.write();
        edges.entry(base.clone()).or_default();
        edges.entry(quote.clone()).or_default();

        if base == quote {
            return InsertOutcome::Unchanged;
        }
        if edges[base].get(quote) == Some(&rate.factor()) {
            return InsertOutcome::Unchanged;
        }

        if let Some(out) = edges.get_mut(base) {
            out.insert(quote.clone(), rate.factor());
        }
        if let Some(back) = edges.get_mut(quote) {
            back.insert(base.clone(), rate.factor().recip());
        }

        InsertOutcome::Updated { paths_updated: 1 }
    }

    fn best_factor(&self, from: &Currency, to: &Currency) -> GraphResult<Factor> {
        let edges = self.edges.read();
        if !edges.contains_key(from) {
            return Err(GraphError::VertexNotFound(from.clone()));
        }
        if !edges.contains_key(to) {
            return Err(GraphError::VertexNotFound(to.clone()));
        }
        if from == to {
            return Ok(Factor::ONE);
        }

        let mut visited = HashSet::from([from]);
        let mut best = None;
        Self::search(&edges, from, to, Factor::ONE, &mut visited, &mut best);

        best.ok_or_else(|| GraphError::PathNotFound {
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn contains_vertex(&self, currency: &Currency) -> bool {
        self.edges.read().contains_key(currency)
    }
}
