//! Core of the milk-collection pipeline
//!
//! Pure domain logic shared by the backend and the browser console (via
//! WASM): unit conversion, price resolution, duplicate detection and the
//! daily, pivot and period aggregations. Nothing here performs I/O.

pub mod aggregation;
pub mod calendar;
pub mod collection;
pub mod conflicts;
pub mod error;
pub mod models;
pub mod pricing;
pub mod types;
pub mod units;
pub mod validation;

pub use aggregation::*;
pub use calendar::*;
pub use collection::*;
pub use conflicts::*;
pub use error::*;
pub use models::*;
pub use pricing::*;
pub use types::*;
pub use units::*;
pub use validation::*;
