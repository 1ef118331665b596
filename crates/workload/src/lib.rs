//! Workload sources for the judging scheduler: synthetic task generation and
//! JSON dataset suites on disk.

pub mod dataset;
pub mod error;
pub mod generator;
pub mod manager;

pub use dataset::{Dataset, TaskRecord};
pub use error::WorkloadError;
pub use generator::TaskGenerator;
pub use manager::{DataManager, SuiteShape};
