pub mod scheduler;

pub use judgesim_core::{SchedulerConfig, WeightPolicy};
pub use scheduler::{
    CompletedTask, Container, ContainerReport, ContainerStatistic, RunHandle, Scheduler,
    SchedulerError, SimulationReport,
};
