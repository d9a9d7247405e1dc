//! Read-side aggregations over fetched production and delivery rows
//!
//! All functions here are pure and take the local calendar explicitly.

mod daily;
mod period;
mod pivot;

pub use daily::*;
pub use period::*;
pub use pivot::*;
