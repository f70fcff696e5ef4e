//! RateMesh Rate Graph
//!
//! Directed graph of published exchange rates with a cached table of the
//! best known conversion factor between every pair of connected currencies.
//!
//! # Features
//!
//! - Incremental path propagation on every published rate (no full re-search)
//! - O(1) factor lookups that never observe a half-updated forward/reverse pair
//! - Single-writer, many-reader concurrency
//! - Brute-force baseline for verifying the incremental table
//!
//! # Example
//!
//! ```rust,ignore
//! use ratemesh_common::{Currency, Rate};
//! use ratemesh_graph::{IncrementalRateGraph, RateGraph};
//!
//! let graph = IncrementalRateGraph::new();
//! graph.insert_edge(&Currency::new("BTC"), &Currency::new("EUR"), Rate::parse("50000")?);
//! graph.insert_edge(&Currency::new("EUR"), &Currency::new("AUD"), Rate::parse("1.5")?);
//!
//! let factor = graph.best_factor(&Currency::new("BTC"), &Currency::new("AUD"))?;
//! ```

pub mod baseline;
pub mod error;
pub mod graph;
pub mod incremental;

pub use baseline::BruteForceRateGraph;
pub use error::{GraphError, GraphResult};
pub use graph::{InsertOutcome, PathEntry, RateGraph};
pub use incremental::IncrementalRateGraph;
