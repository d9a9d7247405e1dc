//! HTTP handlers for the milk collection console

pub mod delivery;
pub mod health;
pub mod milk;
pub mod production;
pub mod reporting;
pub mod validation;

pub use delivery::*;
pub use health::*;
pub use milk::*;
pub use production::*;
pub use reporting::*;
