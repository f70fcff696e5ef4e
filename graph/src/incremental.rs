//! Rate graph with an incrementally maintained best-path table.

use std::collections::{BTreeSet, HashMap};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use ratemesh_common::{Currency, Factor, Rate};

use crate::error::{GraphError, GraphResult};
use crate::graph::{InsertOutcome, PathEntry, RateGraph};

/// Index of a currency in the vertex arena.
pub type VertexId = usize;

/// Unordered vertex pair, `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey {
    lo: VertexId,
    hi: VertexId,
}

impl PairKey {
    fn new(a: VertexId, b: VertexId) -> Self {
        if a < b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }
}

/// Both directions of one cached path.
///
/// Keeping them in a single slot makes every forward/reverse update one
/// map write, so readers cannot see one direction without the other.
#[derive(Debug, Clone, Copy)]
struct PathSlot {
    lo_to_hi: Factor,
    hi_to_lo: Factor,
    hops: u32,
}

impl PathSlot {
    /// Slot for a path `from -> to` with the given factor.
    fn between(from: VertexId, to: VertexId, factor: Factor, hops: u32) -> Self {
        let reverse = factor.recip();
        if from < to {
            Self {
                lo_to_hi: factor,
                hi_to_lo: reverse,
                hops,
            }
        } else {
            Self {
                lo_to_hi: reverse,
                hi_to_lo: factor,
                hops,
            }
        }
    }

    fn factor(&self, from: VertexId, to: VertexId) -> Factor {
        if from < to {
            self.lo_to_hi
        } else {
            self.hi_to_lo
        }
    }

    fn entry(&self, from: VertexId, to: VertexId) -> PathEntry {
        PathEntry {
            factor: self.factor(from, to),
            hops: self.hops,
        }
    }
}

/// State touched only by the single writer.
#[derive(Debug, Default)]
struct Topology {
    /// Direct rates, including the unit self edge of every vertex.
    edges: Vec<HashMap<VertexId, Decimal>>,
    /// Vertices sharing a cached path with each vertex (self excluded).
    reachable: Vec<BTreeSet<VertexId>>,
}

/// Snapshot of one cached path used during propagation.
#[derive(Debug, Clone, Copy)]
struct Reach {
    vertex: VertexId,
    factor: Factor,
    hops: u32,
}

/// Rate graph that recomputes best paths incrementally on every insert.
///
/// Inserting `a -> b` only considers paths `x -> a -> b -> y` built from
/// already cached paths, so the work is proportional to
/// `|reachable(a)| * |reachable(b)|` rather than a full all-pairs search.
/// A cached factor is replaced only when a candidate beats it after
/// rounding the difference to 4 digits: the table keeps the most
/// favourable rate, not the shortest or most recent route.
pub struct IncrementalRateGraph {
    /// Currency to arena index.
    ids: DashMap<Currency, VertexId>,
    /// Arena index to currency.
    names: RwLock<Vec<Currency>>,
    /// Best known paths between distinct vertices.
    paths: DashMap<PairKey, PathSlot>,
    /// Held for the whole insert + propagate sequence.
    topology: Mutex<Topology>,
}

impl IncrementalRateGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
            names: RwLock::new(Vec::new()),
            paths: DashMap::new(),
            topology: Mutex::new(Topology::default()),
        }
    }

    /// Best known path from `from` to `to`, with its hop count.
    pub fn path(&self, from: &Currency, to: &Currency) -> GraphResult<PathEntry> {
        let (a, b) = self.resolve(from, to)?;
        if a == b {
            return Ok(PathEntry::identity());
        }

        self.paths
            .get(&PairKey::new(a, b))
            .map(|slot| slot.entry(a, b))
            .ok_or_else(|| GraphError::PathNotFound {
                from: from.clone(),
                to: to.clone(),
            })
    }

    /// Both directions of a cached path, read together.
    pub fn path_pair(&self, from: &Currency, to: &Currency) -> GraphResult<(PathEntry, PathEntry)> {
        let (a, b) = self.resolve(from, to)?;
        if a == b {
            return Ok((PathEntry::identity(), PathEntry::identity()));
        }

        self.paths
            .get(&PairKey::new(a, b))
            .map(|slot| (slot.entry(a, b), slot.entry(b, a)))
            .ok_or_else(|| GraphError::PathNotFound {
                from: from.clone(),
                to: to.clone(),
            })
    }

    /// Direct rate `base -> quote`, if one was published in either direction.
    ///
    /// Waits for any running propagation.
    pub fn edge(&self, base: &Currency, quote: &Currency) -> Option<Decimal> {
        let a = self.id_of(base)?;
        let b = self.id_of(quote)?;
        let topology = self.topology.lock();
        topology.edges.get(a)?.get(&b).copied()
    }

    /// Number of known currencies.
    pub fn vertex_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of cached paths between distinct currencies, counting each
    /// direction once.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// All known currencies in order of first appearance.
    pub fn currencies(&self) -> Vec<Currency> {
        self.names.read().clone()
    }

    fn id_of(&self, currency: &Currency) -> Option<VertexId> {
        self.ids.get(currency).map(|id| *id)
    }

    fn resolve(&self, from: &Currency, to: &Currency) -> GraphResult<(VertexId, VertexId)> {
        let a = self
            .id_of(from)
            .ok_or_else(|| GraphError::VertexNotFound(from.clone()))?;
        let b = self
            .id_of(to)
            .ok_or_else(|| GraphError::VertexNotFound(to.clone()))?;
        Ok((a, b))
    }

    /// Register a currency, giving it a unit self edge.
    fn ensure_vertex(&self, topology: &mut Topology, currency: &Currency) -> VertexId {
        if let Some(id) = self.id_of(currency) {
            return id;
        }

        let id = topology.edges.len();
        topology.edges.push(HashMap::from([(id, Decimal::ONE)]));
        topology.reachable.push(BTreeSet::new());

        // Name first: a reader that sees the id can always resolve it.
        self.names.write().push(currency.clone());
        self.ids.insert(currency.clone(), id);

        debug!(currency = %currency, vertex = id, "Registered currency");
        id
    }

    /// Cached paths leaving `from`, including the 0-hop self path.
    fn paths_from(&self, topology: &Topology, from: VertexId) -> Vec<Reach> {
        let mut reach = Vec::with_capacity(topology.reachable[from].len() + 1);
        reach.push(Reach {
            vertex: from,
            factor: Factor::ONE,
            hops: 0,
        });

        for &to in &topology.reachable[from] {
            if let Some(slot) = self.paths.get(&PairKey::new(from, to)) {
                reach.push(Reach {
                    vertex: to,
                    factor: slot.factor(from, to),
                    hops: slot.hops,
                });
            }
        }

        reach
    }

    /// Offer every path `x -> a -> b -> y` made of cached paths, then the
    /// direct edge. Returns how many pairs were created or improved.
    fn propagate(&self, topology: &mut Topology, a: VertexId, b: VertexId, weight: Factor) -> usize {
        let sources = self.paths_from(topology, a);
        let targets = self.paths_from(topology, b);
        let mut updated = 0;

        for source in &sources {
            // a -> x inverted gives x -> a
            let through_edge = source.factor.recip().compose(weight);

            for target in &targets {
                if source.vertex == target.vertex {
                    continue;
                }

                let factor = through_edge.compose(target.factor);
                let hops = source.hops + target.hops + 1;
                if self.offer(topology, source.vertex, target.vertex, factor, hops) {
                    updated += 1;
                }
            }
        }

        if self.offer(topology, a, b, weight, 1) {
            updated += 1;
        }

        updated
    }

    /// Store `from -> to` (and its reverse) if it is new or beats the cached factor.
    fn offer(
        &self,
        topology: &mut Topology,
        from: VertexId,
        to: VertexId,
        factor: Factor,
        hops: u32,
    ) -> bool {
        match self.paths.entry(PairKey::new(from, to)) {
            Entry::Occupied(mut entry) => {
                if !factor.exceeds(&entry.get().factor(from, to)) {
                    return false;
                }
                entry.insert(PathSlot::between(from, to, factor, hops));
            }
            Entry::Vacant(entry) => {
                entry.insert(PathSlot::between(from, to, factor, hops));
                topology.reachable[from].insert(to);
                topology.reachable[to].insert(from);
            }
        }

        true
    }
}

impl Default for IncrementalRateGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RateGraph for IncrementalRateGraph {
    #[instrument(skip_all, fields(base = %base, quote = %quote, rate = %rate))]
    fn insert_edge(&self, base: &Currency, quote: &Currency, rate: Rate) -> InsertOutcome {
        let mut topology = self.topology.lock();

        let a = self.ensure_vertex(&mut topology, base);
        let b = self.ensure_vertex(&mut topology, quote);
        if a == b {
            warn!("Ignoring rate from a currency to itself");
            return InsertOutcome::Unchanged;
        }

        if topology.edges[a].get(&b) == Some(&rate.value()) {
            debug!("Rate unchanged");
            return InsertOutcome::Unchanged;
        }

        topology.edges[a].insert(b, rate.value());
        topology.edges[b].insert(a, rate.reciprocal());

        let paths_updated = self.propagate(&mut topology, a, b, rate.factor());
        debug!(paths_updated, total_paths = self.paths.len(), "Propagated rate");

        InsertOutcome::Updated { paths_updated }
    }

    fn best_factor(&self, from: &Currency, to: &Currency) -> GraphResult<Factor> {
        self.path(from, to).map(|entry| entry.factor)
    }

    fn contains_vertex(&self, currency: &Currency) -> bool {
        self.ids.contains_key(currency)
    }
}
