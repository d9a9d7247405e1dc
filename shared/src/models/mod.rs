//! Domain models for milk collection

mod animal;
mod delivery;
mod price;
mod production;

pub use animal::*;
pub use delivery::*;
pub use price::*;
pub use production::*;

pub(crate) use production::{default_currency, default_density, normalize_notes};
