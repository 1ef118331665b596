use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{JudgeSimError, Result};

/// Problem identifier.
pub type ProblemId = u64;

/// Task identifier, unique within one generation batch only.
pub type TaskId = u64;

/// Judging limits and statistics for one problem.
///
/// Created once per problem before task generation and shared by every task
/// of that problem through an `Arc`. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemInfo {
    pub problem_id: ProblemId,
    /// Fraction of submissions that hit the time limit, in `[0, 1]`.
    pub tle_rate: f64,
    /// Fraction of submissions that hit the memory limit, in `[0, 1]`.
    /// Not used by scheduling.
    pub mle_rate: f64,
    /// Time limit in milliseconds.
    pub limited_time: u64,
    /// Memory limit in bytes.
    pub limited_memory: u64,
}

impl ProblemInfo {
    /// Build a validated problem record.
    pub fn new(
        problem_id: ProblemId,
        tle_rate: f64,
        mle_rate: f64,
        limited_time: u64,
        limited_memory: u64,
    ) -> Result<Self> {
        let problem = Self {
            problem_id,
            tle_rate,
            mle_rate,
            limited_time,
            limited_memory,
        };
        problem.validate()?;
        Ok(problem)
    }

    /// Check rates and limits. Records loaded from disk skip `new`, so the
    /// dataset loader calls this directly.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| JudgeSimError::InvalidProblem {
            problem_id: self.problem_id,
            reason,
        };
        if !(0.0..=1.0).contains(&self.tle_rate) {
            return Err(invalid(format!("tle_rate {} outside [0, 1]", self.tle_rate)));
        }
        if !(0.0..=1.0).contains(&self.mle_rate) {
            return Err(invalid(format!("mle_rate {} outside [0, 1]", self.mle_rate)));
        }
        if self.limited_time == 0 {
            return Err(invalid("limited_time must be positive".to_string()));
        }
        if self.limited_memory == 0 {
            return Err(invalid("limited_memory must be positive".to_string()));
        }
        Ok(())
    }

    /// Expected time spent on TLE submissions: `tle_rate × limited_time`.
    pub fn expected_weight(&self) -> f64 {
        self.tle_rate * self.limited_time as f64
    }
}

/// One judging job. Immutable once created.
#[derive(Debug, Clone)]
pub struct JudgeTask {
    pub tid: TaskId,
    pub problem_info: Arc<ProblemInfo>,
    /// Submission payload, opaque to the scheduler.
    pub code: String,
    /// Snapshot of the problem's time limit at creation.
    pub limited_time: u64,
    /// Snapshot of the problem's memory limit at creation.
    pub limited_memory: u64,
    /// Simulated execution time the task reports when it runs.
    pub exec_time: f64,
    /// Simulated memory usage in bytes.
    pub exec_memory: u64,
}

impl JudgeTask {
    /// Create a task whose limits are copied from `problem`.
    pub fn for_problem(
        tid: TaskId,
        problem: &Arc<ProblemInfo>,
        code: impl Into<String>,
        exec_time: f64,
        exec_memory: u64,
    ) -> Self {
        Self {
            tid,
            problem_info: Arc::clone(problem),
            code: code.into(),
            limited_time: problem.limited_time,
            limited_memory: problem.limited_memory,
            exec_time,
            exec_memory,
        }
    }

    pub fn problem_id(&self) -> ProblemId {
        self.problem_info.problem_id
    }

    /// Check the simulated execution time: it must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if !(self.exec_time.is_finite() && self.exec_time >= 0.0) {
            return Err(JudgeSimError::InvalidTask {
                tid: self.tid,
                problem_id: self.problem_id(),
                reason: format!("exec_time {} must be finite and non-negative", self.exec_time),
            });
        }
        Ok(())
    }

    /// Load-balancing weight: the problem's TLE rate times this task's
    /// snapshot time limit.
    pub fn weight(&self) -> f64 {
        self.problem_info.tle_rate * self.limited_time as f64
    }

    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            tid: self.tid,
            limited_time: self.limited_time,
            limited_memory: self.limited_memory,
        }
    }
}

/// Short task summary for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub tid: TaskId,
    pub limited_time: u64,
    pub limited_memory: u64,
}
