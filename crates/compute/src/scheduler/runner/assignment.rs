use tracing::debug;

use judgesim_core::JudgeTask;

use crate::scheduler::error::SchedulerError;

use super::Scheduler;

impl Scheduler {
    /// Index of the least-loaded container eligible for `task`.
    ///
    /// Weights are read one container at a time in list order; the first
    /// container with the strictly smallest weight wins, so ties go to the
    /// earliest index. With `capacity_aware` set, containers whose memory is
    /// below the task's memory limit are skipped.
    pub fn select(&self, task: &JudgeTask) -> Result<usize, SchedulerError> {
        let mut selected: Option<(usize, f64)> = None;
        for (idx, container) in self.containers.iter().enumerate() {
            if self.config.capacity_aware && !container.fits(task) {
                continue;
            }
            let weight = container.current_weight();
            match selected {
                Some((_, min)) if min <= weight => {}
                _ => selected = Some((idx, weight)),
            }
        }
        selected
            .map(|(idx, _)| idx)
            .ok_or(SchedulerError::NoEligibleContainer {
                tid: task.tid,
                limited_memory: task.limited_memory,
            })
    }

    /// Enqueue `task` on the least-loaded container and return its index.
    ///
    /// The read-pick-enqueue sequence is not atomic across containers. Two
    /// producers racing may both pick the same container; the pick is stale
    /// by at most the other producers' in-flight tasks.
    pub fn assign_one(&self, task: JudgeTask) -> Result<usize, SchedulerError> {
        task.validate()?;
        let idx = self.select(&task)?;
        let container = &self.containers[idx];
        debug!(
            tid = task.tid,
            problem_id = task.problem_id(),
            weight = task.weight(),
            container_id = container.id(),
            "Task assigned"
        );
        container.enqueue([task]);
        Ok(idx)
    }

    /// Assign tasks one by one in input order. Each assignment re-reads all
    /// weights, so earlier tasks of the batch steer later ones.
    ///
    /// The whole batch is checked first, so a malformed task, or with
    /// `capacity_aware` set a task that fits nowhere, fails the call before
    /// anything is enqueued.
    pub fn assign_many(
        &self,
        tasks: impl IntoIterator<Item = JudgeTask>,
    ) -> Result<usize, SchedulerError> {
        let tasks: Vec<JudgeTask> = tasks.into_iter().collect();
        for task in &tasks {
            task.validate()?;
        }
        if self.config.capacity_aware {
            if let Some(task) = tasks
                .iter()
                .find(|t| !self.containers.iter().any(|c| c.fits(t)))
            {
                return Err(SchedulerError::NoEligibleContainer {
                    tid: task.tid,
                    limited_memory: task.limited_memory,
                });
            }
        }

        let count = tasks.len();
        for task in tasks {
            self.assign_one(task)?;
        }
        debug!(count, "Batch assigned");
        Ok(count)
    }
}
