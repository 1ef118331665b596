use thiserror::Error;

#[derive(Error, Debug)]
pub enum JudgeSimError {
    #[error("Invalid problem {problem_id}: {reason}")]
    InvalidProblem { problem_id: u64, reason: String },

    #[error("Invalid task {tid} of problem {problem_id}: {reason}")]
    InvalidTask { tid: u64, problem_id: u64, reason: String },

    #[error("Invalid container {container_id}: {reason}")]
    InvalidContainer { container_id: u64, reason: String },

    #[error("Invalid config value for {key}: {value}")]
    InvalidConfig { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, JudgeSimError>;
