//! RateMesh Node
//!
//! Boundary process that accepts publish and convert requests over TCP
//! and answers them from an in-memory conversion service. Rates are never
//! persisted; a restarted node starts from an empty graph.

pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod server;
pub mod state;

pub use config::NodeConfig;
pub use error::{NodeError, NodeResult};
pub use handler::RatesHandler;
pub use server::RatesServer;
