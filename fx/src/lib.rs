//! RateMesh FX Service
//!
//! Domain-facing operations over the rate graph: publishing rates and
//! converting amounts between currencies.
//!
//! # Features
//!
//! - Validation of externally supplied prices and amounts
//! - Conversion through the best known chain of rates
//! - 4-digit half-up output rounding
//! - Graph failures relabelled as domain failures
//!
//! # Example
//!
//! ```rust,ignore
//! use ratemesh_fx::ConversionService;
//!
//! let service = ConversionService::new();
//! service.add_rate("BTC", "EUR", "50000.0000")?;
//! service.add_rate("EUR", "AUD", "1.5000")?;
//!
//! let aud = service.convert_str("BTC", "AUD", "1.0000")?;
//! assert_eq!(aud, "75000.0000");
//! ```

pub mod error;
pub mod service;

pub use error::{FxError, FxResult};
pub use service::ConversionService;
