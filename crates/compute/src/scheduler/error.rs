use judgesim_core::{ContainerId, JudgeSimError, TaskId};

/// Error type for scheduler construction, assignment and execution.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler needs at least one container")]
    NoContainers,
    #[error("Invalid time_scale: {0}")]
    InvalidTimeScale(f64),
    #[error("Duplicate container id: {0}")]
    DuplicateContainer(ContainerId),
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] JudgeSimError),
    #[error("No container can hold task {tid} (limited_memory={limited_memory})")]
    NoEligibleContainer { tid: TaskId, limited_memory: u64 },
    #[error("Failed to spawn worker for container {container_id}: {source}")]
    WorkerSpawn {
        container_id: ContainerId,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker for container {0} panicked")]
    WorkerPanicked(ContainerId),
}
