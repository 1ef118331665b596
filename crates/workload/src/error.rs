//! Workload error types.

use std::path::PathBuf;

use thiserror::Error;

use judgesim_core::{JudgeSimError, ProblemId};

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid record: {0}")]
    Record(#[from] JudgeSimError),

    #[error("no problems to generate tasks for")]
    NoProblems,

    #[error("per-problem counts sum to {actual}, expected {expected}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("unknown problem: {0}")]
    UnknownProblem(ProblemId),

    #[error("duplicate problem: {0}")]
    DuplicateProblem(ProblemId),

    #[error("suite shape must be non-zero: {0}")]
    EmptyShape(String),

    #[error("cannot recognize suite file name: {}", .0.display())]
    SuiteName(PathBuf),
}

pub type Result<T> = std::result::Result<T, WorkloadError>;
