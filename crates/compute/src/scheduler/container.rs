//! Judging container: a FIFO task queue with a load estimate.
//!
//! All mutable state sits behind one per-container mutex, so the queue and
//! its weight are always read and written together. The scheduler and the
//! container's own run loop only ever touch the state through the methods
//! below.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use judgesim_core::{ContainerId, ContainerSpec, JudgeTask, ProblemId, TaskId, WeightPolicy};

/// Running counters of a container's run loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatistic {
    /// Number of tasks completed.
    pub finished: u64,
    /// Sum of `exec_time` over completed tasks.
    pub time_cost: f64,
}

/// One completed task, in completion order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub tid: TaskId,
    pub problem_id: ProblemId,
    pub exec_time: f64,
}

#[derive(Debug, Default)]
struct ContainerState {
    task_queue: VecDeque<JudgeTask>,
    weight: f64,
    statistic: ContainerStatistic,
    history: Vec<CompletedTask>,
    task_count: u64,
}

/// An execution slot with its own queue, weight and statistics.
#[derive(Debug)]
pub struct Container {
    spec: ContainerSpec,
    policy: WeightPolicy,
    state: Mutex<ContainerState>,
}

impl Container {
    pub fn new(spec: ContainerSpec, policy: WeightPolicy) -> Self {
        Self {
            spec,
            policy,
            state: Mutex::new(ContainerState::default()),
        }
    }

    // Critical sections never panic halfway through an update, so a poisoned
    // lock still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, ContainerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> ContainerId {
        self.spec.container_id
    }

    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    pub fn policy(&self) -> WeightPolicy {
        self.policy
    }

    /// Whether the slot's memory can hold the task's memory limit.
    pub fn fits(&self, task: &JudgeTask) -> bool {
        task.limited_memory <= self.spec.memory
    }

    /// Snapshot of the current weight. May be stale as soon as it returns.
    pub fn current_weight(&self) -> f64 {
        self.lock().weight
    }

    /// Append `tasks` to the queue and add their weights in one critical section.
    pub fn enqueue(&self, tasks: impl IntoIterator<Item = JudgeTask>) {
        let mut state = self.lock();
        for task in tasks {
            state.weight += task.weight();
            state.task_count += 1;
            state.task_queue.push_back(task);
        }
    }

    /// Pop the head of the queue, or `None` when empty.
    ///
    /// Under [`WeightPolicy::Backlog`] the task's weight leaves with it.
    pub fn dequeue_one(&self) -> Option<JudgeTask> {
        let mut state = self.lock();
        let task = state.task_queue.pop_front()?;
        if self.policy == WeightPolicy::Backlog {
            if state.task_queue.is_empty() {
                state.weight = 0.0;
            } else {
                state.weight = (state.weight - task.weight()).max(0.0);
            }
        }
        Some(task)
    }

    /// Drain the queue one task at a time until it is observed empty or
    /// `shutdown` is set. Tasks enqueued mid-drain are picked up.
    ///
    /// `time_scale` is the wall-clock milliseconds slept per unit of
    /// `exec_time`; the sleep happens outside the lock.
    pub fn run_loop(&self, shutdown: &AtomicBool, time_scale: f64) -> ContainerStatistic {
        debug!(container_id = self.id(), "Run loop started");
        loop {
            if shutdown.load(Ordering::Relaxed) {
                let left = self.queue_len();
                if left > 0 {
                    warn!(container_id = self.id(), left, "Run loop stopped with tasks queued");
                }
                break;
            }
            let Some(task) = self.dequeue_one() else {
                break;
            };
            if time_scale > 0.0 {
                self.simulate_exec(&task, time_scale);
            }
            self.record_completion(&task);
        }
        let statistic = self.statistic();
        debug!(
            container_id = self.id(),
            finished = statistic.finished,
            time_cost = statistic.time_cost,
            "Run loop finished"
        );
        statistic
    }

    /// Sleep for the task's scaled execution time. A duration that is not
    /// representable is skipped; the task is still accounted.
    fn simulate_exec(&self, task: &JudgeTask, time_scale: f64) {
        match Duration::try_from_secs_f64(task.exec_time * time_scale / 1000.0) {
            Ok(duration) => std::thread::sleep(duration),
            Err(e) => warn!(
                container_id = self.id(),
                tid = task.tid,
                exec_time = task.exec_time,
                time_scale,
                error = %e,
                "Skipping wall-clock delay"
            ),
        }
    }

    fn record_completion(&self, task: &JudgeTask) {
        let mut state = self.lock();
        state.statistic.time_cost += task.exec_time;
        state.statistic.finished += 1;
        state.history.push(CompletedTask {
            tid: task.tid,
            problem_id: task.problem_id(),
            exec_time: task.exec_time,
        });
        trace!(
            container_id = self.spec.container_id,
            tid = task.tid,
            problem_id = task.problem_id(),
            exec_time = task.exec_time,
            "Task finished"
        );
    }

    pub fn statistic(&self) -> ContainerStatistic {
        self.lock().statistic
    }

    /// Completed tasks in completion order.
    pub fn history(&self) -> Vec<CompletedTask> {
        self.lock().history.clone()
    }

    /// Tasks ever enqueued on this container.
    pub fn task_count(&self) -> u64 {
        self.lock().task_count
    }

    pub fn queue_len(&self) -> usize {
        self.lock().task_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use judgesim_core::ProblemInfo;

    use super::*;

    fn task(tid: TaskId, tle_rate: f64, limited_time: u64, exec_time: f64) -> JudgeTask {
        let problem = Arc::new(ProblemInfo::new(tid, tle_rate, 0.5, limited_time, 1024).unwrap());
        JudgeTask::for_problem(tid, &problem, "", exec_time, 512)
    }

    fn container(policy: WeightPolicy) -> Container {
        Container::new(ContainerSpec::new(0, 4096), policy)
    }

    #[test]
    fn enqueue_adds_weights() {
        let c = container(WeightPolicy::Backlog);
        c.enqueue(vec![task(0, 0.5, 20, 1.0), task(1, 1.0, 20, 1.0)]);
        assert_eq!(c.current_weight(), 30.0);
        assert_eq!(c.queue_len(), 2);
        assert_eq!(c.task_count(), 2);
    }

    #[test]
    fn weight_read_is_idempotent() {
        let c = container(WeightPolicy::Backlog);
        c.enqueue(vec![task(0, 0.3, 70, 1.0)]);
        assert_eq!(c.current_weight(), c.current_weight());
    }

    #[test]
    fn dequeue_on_empty_returns_none() {
        let c = container(WeightPolicy::Backlog);
        assert!(c.dequeue_one().is_none());
        assert_eq!(c.current_weight(), 0.0);
    }

    #[test]
    fn backlog_policy_decrements_on_dequeue() {
        let c = container(WeightPolicy::Backlog);
        c.enqueue(vec![task(0, 0.5, 20, 1.0), task(1, 0.25, 20, 1.0)]);
        assert_eq!(c.dequeue_one().unwrap().tid, 0);
        assert_eq!(c.current_weight(), 5.0);
        c.dequeue_one().unwrap();
        assert_eq!(c.current_weight(), 0.0);
    }

    #[test]
    fn backlog_policy_leaves_no_float_residue() {
        let c = container(WeightPolicy::Backlog);
        c.enqueue((0..10).map(|i| task(i, 0.1, 3, 1.0)));
        while c.dequeue_one().is_some() {}
        assert_eq!(c.current_weight(), 0.0);
    }

    #[test]
    fn cumulative_policy_never_decrements() {
        let c = container(WeightPolicy::Cumulative);
        c.enqueue(vec![task(0, 0.5, 20, 1.0), task(1, 0.25, 20, 1.0)]);
        while c.dequeue_one().is_some() {}
        assert_eq!(c.current_weight(), 15.0);
    }

    #[test]
    fn run_loop_accumulates_statistics() {
        let c = container(WeightPolicy::Backlog);
        c.enqueue(vec![task(0, 0.5, 20, 3.5), task(1, 0.5, 20, 1.5)]);
        let stat = c.run_loop(&AtomicBool::new(false), 0.0);
        assert_eq!(stat, ContainerStatistic { finished: 2, time_cost: 5.0 });
        assert_eq!(c.statistic(), stat);
        assert_eq!(c.queue_len(), 0);
    }

    #[test]
    fn run_loop_consumes_in_fifo_order() {
        let c = container(WeightPolicy::Backlog);
        c.enqueue((0..5).map(|i| task(i, 0.5, 10, 1.0)));
        c.enqueue((5..8).map(|i| task(i, 0.5, 10, 1.0)));
        c.run_loop(&AtomicBool::new(false), 0.0);
        let order: Vec<TaskId> = c.history().iter().map(|t| t.tid).collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn run_loop_on_empty_queue_returns_immediately() {
        let c = container(WeightPolicy::Backlog);
        assert_eq!(c.run_loop(&AtomicBool::new(false), 0.0), ContainerStatistic::default());
    }

    #[test]
    fn run_loop_honors_shutdown() {
        let c = container(WeightPolicy::Backlog);
        c.enqueue(vec![task(0, 0.5, 20, 1.0)]);
        let stat = c.run_loop(&AtomicBool::new(true), 0.0);
        assert_eq!(stat.finished, 0);
        assert_eq!(c.queue_len(), 1);
    }

    #[test]
    fn run_loop_survives_unrepresentable_delay() {
        let c = container(WeightPolicy::Backlog);
        let mut negative = task(0, 0.5, 20, 1.0);
        negative.exec_time = -5.0;
        c.enqueue(vec![negative, task(1, 0.5, 20, 2.0)]);
        let stat = c.run_loop(&AtomicBool::new(false), 1.0);
        assert_eq!(stat, ContainerStatistic { finished: 2, time_cost: -3.0 });
        assert_eq!(c.queue_len(), 0);
    }

    #[test]
    fn fits_compares_memory_limit() {
        let c = container(WeightPolicy::Backlog);
        let mut t = task(0, 0.5, 20, 1.0);
        assert!(c.fits(&t));
        t.limited_memory = 4097;
        assert!(!c.fits(&t));
    }
}
