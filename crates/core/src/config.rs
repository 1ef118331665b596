use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{JudgeSimError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, failing on values that are present but malformed.
fn profiled_env_parse<T: FromStr>(profile: &str, key: &str, default: T) -> Result<T> {
    match profiled_env_opt(profile, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| JudgeSimError::InvalidConfig { key: key.to_string(), value: raw }),
        None => Ok(default),
    }
}

fn profiled_env_parse_opt<T: FromStr>(profile: &str, key: &str) -> Result<Option<T>> {
    match profiled_env_opt(profile, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| JudgeSimError::InvalidConfig { key: key.to_string(), value: raw }),
        None => Ok(None),
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub workload: WorkloadConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `JUDGESIM_PROFILE`. When set (e.g. `BENCH`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or("JUDGESIM_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            workload: WorkloadConfig::from_env_profiled(p)?,
            scheduler: SchedulerConfig::from_env_profiled(p)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  storage:     data_dir={}", self.storage.data_dir.display());
        tracing::info!(
            "  workload:    containers={}, problems={}, tasks={}, suits={}, seed={}",
            self.workload.containers,
            self.workload.problems,
            self.workload.tasks,
            self.workload.suits,
            self.workload.seed.map(|s| s.to_string()).unwrap_or_else(|| "(random)".to_string()),
        );
        tracing::info!(
            "  scheduler:   weight_policy={}, capacity_check={}, time_scale={}",
            self.scheduler.weight_policy,
            self.scheduler.capacity_aware,
            self.scheduler.time_scale,
        );
    }

    /// Config as JSON, for `--json` output alongside reports.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "storage": { "data_dir": self.storage.data_dir },
            "workload": self.workload,
            "scheduler": self.scheduler,
        })
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for generated dataset suites.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
        }
    }
}

// ── Workload ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub containers: usize,
    pub problems: usize,
    pub tasks: usize,
    pub suits: usize,
    /// RNG seed for reproducible generation. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl WorkloadConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        Ok(Self {
            containers: profiled_env_parse(p, "SIM_CONTAINERS", 4)?,
            problems: profiled_env_parse(p, "SIM_PROBLEMS", 10)?,
            tasks: profiled_env_parse(p, "SIM_TASKS", 100)?,
            suits: profiled_env_parse(p, "SIM_SUITS", 1)?,
            seed: profiled_env_parse_opt(p, "SIM_SEED")?,
        })
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            containers: 4,
            problems: 10,
            tasks: 100,
            suits: 1,
            seed: None,
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────

/// How a container's weight reacts to tasks leaving its queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightPolicy {
    /// Weight is decremented on dequeue and tracks the current backlog.
    #[default]
    Backlog,
    /// Weight only grows: total work ever assigned to the container.
    Cumulative,
}

impl fmt::Display for WeightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightPolicy::Backlog => write!(f, "backlog"),
            WeightPolicy::Cumulative => write!(f, "cumulative"),
        }
    }
}

impl FromStr for WeightPolicy {
    type Err = JudgeSimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "backlog" => Ok(WeightPolicy::Backlog),
            "cumulative" => Ok(WeightPolicy::Cumulative),
            _ => Err(JudgeSimError::InvalidConfig {
                key: "weight_policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Scheduler configuration, from env or deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub weight_policy: WeightPolicy,
    /// Skip containers whose memory cannot hold a task's memory limit.
    #[serde(default = "default_capacity_aware")]
    pub capacity_aware: bool,
    /// Wall-clock milliseconds slept per unit of `exec_time`. 0 = pure accounting.
    #[serde(default)]
    pub time_scale: f64,
}

fn default_capacity_aware() -> bool { true }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weight_policy: WeightPolicy::default(),
            capacity_aware: default_capacity_aware(),
            time_scale: 0.0,
        }
    }
}

impl SchedulerConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let config = Self {
            weight_policy: profiled_env_parse(p, "SCHED_WEIGHT_POLICY", WeightPolicy::default())?,
            capacity_aware: profiled_env_parse(p, "SCHED_CAPACITY_CHECK", default_capacity_aware())?,
            time_scale: profiled_env_parse(p, "SCHED_TIME_SCALE", 0.0)?,
        };
        if !(config.time_scale >= 0.0 && config.time_scale.is_finite()) {
            return Err(JudgeSimError::InvalidConfig {
                key: "SCHED_TIME_SCALE".to_string(),
                value: config.time_scale.to_string(),
            });
        }
        Ok(config)
    }

    /// Reference behavior: cumulative weights, no capacity check.
    pub fn reference() -> Self {
        Self {
            weight_policy: WeightPolicy::Cumulative,
            capacity_aware: false,
            time_scale: 0.0,
        }
    }
}
