//! Business logic services for the milk collection console

pub mod collection;
pub mod dashboard;
pub mod reporting;

pub use collection::CollectionService;
pub use dashboard::DashboardService;
pub use reporting::ReportingService;
