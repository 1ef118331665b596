//! Least-loaded judging scheduler.
//!
//! Each [`Container`] owns a FIFO queue and a weight (`tle_rate ×
//! limited_time` summed over its tasks). The [`Scheduler`] routes every task
//! to the container with the smallest weight, then starts one worker thread
//! per container to drain its queue. Tasks never move between containers
//! after assignment.

pub mod container;
pub mod error;
pub mod report;
pub mod runner;

pub use container::{CompletedTask, Container, ContainerStatistic};
pub use error::SchedulerError;
pub use report::{ContainerReport, SimulationReport};
pub use runner::{RunHandle, Scheduler};
