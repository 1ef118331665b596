use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use judgesim_core::{ContainerSpec, SchedulerConfig};

use crate::scheduler::container::{Container, ContainerStatistic};
use crate::scheduler::error::SchedulerError;

/// Least-loaded scheduler over a fixed set of [`Container`]s.
///
/// Assignment takes `&self`: the scheduler never mutates container internals
/// directly, every change goes through the container's own locked methods.
pub struct Scheduler {
    pub(super) config: SchedulerConfig,
    /// Fixed for the scheduler's lifetime.
    pub(super) containers: Vec<Arc<Container>>,
    /// Shutdown signal polled by run loops between dequeues.
    pub(super) shutdown: Arc<AtomicBool>,
}

impl Scheduler {
    /// Create a scheduler owning one container per spec, in the given order.
    pub fn new(config: SchedulerConfig, specs: Vec<ContainerSpec>) -> Result<Self, SchedulerError> {
        if specs.is_empty() {
            return Err(SchedulerError::NoContainers);
        }
        if !(config.time_scale >= 0.0 && config.time_scale.is_finite()) {
            return Err(SchedulerError::InvalidTimeScale(config.time_scale));
        }
        let mut seen = HashSet::with_capacity(specs.len());
        for spec in &specs {
            spec.validate()?;
            if !seen.insert(spec.container_id) {
                return Err(SchedulerError::DuplicateContainer(spec.container_id));
            }
        }

        let containers: Vec<Arc<Container>> = specs
            .into_iter()
            .map(|spec| Arc::new(Container::new(spec, config.weight_policy)))
            .collect();

        info!(
            containers = containers.len(),
            weight_policy = %config.weight_policy,
            capacity_aware = config.capacity_aware,
            "Scheduler created"
        );

        Ok(Self {
            config,
            containers,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Containers in assignment order.
    pub fn containers(&self) -> &[Arc<Container>] {
        &self.containers
    }

    /// Snapshot of every container's weight, in container order.
    pub fn weights(&self) -> Vec<f64> {
        self.containers.iter().map(|c| c.current_weight()).collect()
    }

    /// Snapshot of every container's statistic, in container order.
    pub fn statistics(&self) -> Vec<ContainerStatistic> {
        self.containers.iter().map(|c| c.statistic()).collect()
    }

    /// Signal run loops to stop after their current task.
    pub fn shutdown(&self) {
        info!("Scheduler shutdown requested");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Get an Arc to the shutdown flag (for external shutdown signaling).
    pub fn shutdown_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}
