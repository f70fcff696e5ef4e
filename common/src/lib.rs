//! RateMesh Common Types
//!
//! This crate contains the vocabulary shared by every RateMesh crate:
//! currency identifiers, validated exchange rates and the decimal policy
//! (unbounded path factors, rounding, update threshold) that all path
//! arithmetic uses.

pub mod decimal;
pub mod error;
pub mod factor;
pub mod monetary;

pub use decimal::*;
pub use error::*;
pub use factor::*;
pub use monetary::*;
