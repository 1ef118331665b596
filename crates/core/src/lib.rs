pub mod config;
pub mod container;
pub mod error;
pub mod task;

pub use config::{Config, SchedulerConfig, WeightPolicy};
pub use container::*;
pub use error::*;
pub use task::*;
