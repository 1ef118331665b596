use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{error, info};

use judgesim_core::{ContainerId, JudgeTask};

use crate::scheduler::container::ContainerStatistic;
use crate::scheduler::error::SchedulerError;

use super::Scheduler;

/// Handles to the per-container workers started by [`Scheduler::run`].
///
/// Dropping the handle detaches the workers; they still run to completion.
pub struct RunHandle {
    workers: Vec<(ContainerId, JoinHandle<ContainerStatistic>)>,
    shutdown: Arc<AtomicBool>,
}

impl RunHandle {
    /// Whether every worker has returned.
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Ask the workers to stop after their current task.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Block until every worker returns. Statistics come back in container order.
    pub fn join(self) -> Result<Vec<ContainerStatistic>, SchedulerError> {
        let mut statistics = Vec::with_capacity(self.workers.len());
        for (container_id, handle) in self.workers {
            match handle.join() {
                Ok(statistic) => statistics.push(statistic),
                Err(_) => {
                    error!(container_id, "Worker panicked");
                    return Err(SchedulerError::WorkerPanicked(container_id));
                }
            }
        }
        Ok(statistics)
    }
}

impl Scheduler {
    /// Assign all `tasks`, then start one worker thread per container running
    /// its run loop. Returns once every worker has been started; completion is
    /// observed through the returned [`RunHandle`].
    ///
    /// If a worker fails to spawn, the shutdown flag is set, the workers
    /// already started are joined, and [`SchedulerError::WorkerSpawn`] is
    /// returned. Unfinished tasks stay queued. The flag stays set, so the
    /// scheduler cannot be run again afterwards.
    pub fn run(
        &self,
        tasks: impl IntoIterator<Item = JudgeTask>,
    ) -> Result<RunHandle, SchedulerError> {
        let assigned = self.assign_many(tasks)?;
        info!(
            tasks = assigned,
            containers = self.containers.len(),
            "Starting container run loops"
        );

        let time_scale = self.config.time_scale;
        let mut workers = Vec::with_capacity(self.containers.len());
        for container in &self.containers {
            let container_id = container.id();
            let container = Arc::clone(container);
            let shutdown = Arc::clone(&self.shutdown);
            let spawned = std::thread::Builder::new()
                .name(format!("container-{}", container_id))
                .spawn(move || container.run_loop(&shutdown, time_scale));
            match spawned {
                Ok(handle) => workers.push((container_id, handle)),
                Err(source) => {
                    error!(container_id, error = %source, "Failed to spawn worker");
                    self.abort_workers(workers);
                    return Err(SchedulerError::WorkerSpawn { container_id, source });
                }
            }
        }

        Ok(RunHandle {
            workers,
            shutdown: Arc::clone(&self.shutdown),
        })
    }

    /// Set the shutdown flag and join `workers`, so no thread outlives a
    /// failed run. Statistics and panics of the joined workers are dropped.
    pub(super) fn abort_workers(
        &self,
        workers: Vec<(ContainerId, JoinHandle<ContainerStatistic>)>,
    ) {
        self.shutdown.store(true, Ordering::Relaxed);
        let joined = workers.len();
        let _ = RunHandle {
            workers,
            shutdown: Arc::clone(&self.shutdown),
        }
        .join();
        info!(joined, "Aborted run, started workers joined");
    }

    /// Convenience: [`run`](Self::run) and wait for every worker.
    pub fn run_to_completion(
        &self,
        tasks: impl IntoIterator<Item = JudgeTask>,
    ) -> Result<Vec<ContainerStatistic>, SchedulerError> {
        self.run(tasks)?.join()
    }
}
