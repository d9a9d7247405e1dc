//! External API integrations

pub mod farm_api;
pub mod memory;

pub use farm_api::{FarmApiClient, FarmDataSource, RecordFilter};
pub use memory::InMemoryFarmData;
