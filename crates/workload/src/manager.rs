use std::path::{Path, PathBuf};

use tracing::info;

use judgesim_core::ContainerSpec;

use crate::dataset::Dataset;
use crate::error::{Result, WorkloadError};
use crate::generator::{TaskGenerator, DEFAULT_LIMITED_MEMORY, DEFAULT_LIMITED_TIME};

/// Memory of generated containers.
pub const DEFAULT_CONTAINER_MEMORY: u64 = 2 * 1024 * 1024 * 1024;

/// Size of a generated workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteShape {
    pub containers: usize,
    pub problems: usize,
    pub tasks: usize,
}

impl SuiteShape {
    pub fn new(containers: usize, problems: usize, tasks: usize) -> Self {
        Self { containers, problems, tasks }
    }

    fn dirname(&self) -> String {
        format!("d-{:05}-{:05}-{:06}", self.containers, self.problems, self.tasks)
    }
}

/// Filesystem-backed dataset suites.
///
/// ```text
/// data/
///   d-00004-00010-000100/   <- one directory per suite shape
///     000.json              <- suite 0
///     001.json
/// ```
pub struct DataManager {
    root: PathBuf,
    generator: TaskGenerator,
}

impl DataManager {
    pub fn new(root: impl Into<PathBuf>, seed: Option<u64>) -> Self {
        Self {
            root: root.into(),
            generator: TaskGenerator::new(seed),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every suite of `shape`.
    pub fn suite_dir(&self, shape: SuiteShape) -> PathBuf {
        self.root.join(shape.dirname())
    }

    /// Path of suite `idx` of `shape`.
    pub fn suite_path(&self, shape: SuiteShape, idx: usize) -> PathBuf {
        self.suite_dir(shape).join(format!("{:03}.json", idx))
    }

    /// Generate one dataset, optionally saving it as the next suite.
    pub fn gen_one(&mut self, shape: SuiteShape, save: bool) -> Result<Dataset> {
        if shape.containers == 0 || shape.problems == 0 || shape.tasks == 0 {
            return Err(WorkloadError::EmptyShape(format!("{:?}", shape)));
        }

        let containers: Vec<ContainerSpec> = (0..shape.containers as u64)
            .map(|id| ContainerSpec::new(id, DEFAULT_CONTAINER_MEMORY))
            .collect();
        let problems = self.generator.random_problems(
            shape.problems,
            DEFAULT_LIMITED_TIME,
            DEFAULT_LIMITED_MEMORY,
        )?;
        let tasks = self
            .generator
            .generate_n_tasks_with_problems(&problems, shape.tasks, None)?;
        let dataset = Dataset::new(containers, &problems, &tasks);

        if save {
            self.save(&dataset, &self.suite_dir(shape))?;
        }
        Ok(dataset)
    }

    /// Generate `suits` datasets of `shape`.
    pub fn gen(&mut self, shape: SuiteShape, suits: usize, save: bool) -> Result<Vec<Dataset>> {
        (0..suits).map(|_| self.gen_one(shape, save)).collect()
    }

    /// Number of suites in `dir`: highest index + 1. Creates `dir` if missing.
    pub fn suite_count(dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(dir)?;
        let mut next = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let idx: usize = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| WorkloadError::SuiteName(path.clone()))?;
            next = next.max(idx + 1);
        }
        Ok(next)
    }

    /// Save `dataset` as the next suite in `dir`, returning its path.
    pub fn save(&self, dataset: &Dataset, dir: &Path) -> Result<PathBuf> {
        let idx = Self::suite_count(dir)?;
        let path = dir.join(format!("{:03}.json", idx));
        let json = serde_json::to_string_pretty(dataset)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), tasks = dataset.tasks.len(), "Saved dataset suite");
        Ok(path)
    }

    pub fn load_one(path: &Path) -> Result<Dataset> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load suites `0..suits` of `shape`, generating any that are missing.
    pub fn load(&mut self, shape: SuiteShape, suits: usize) -> Result<Vec<Dataset>> {
        let count = Self::suite_count(&self.suite_dir(shape))?;
        if suits > count {
            info!(have = count, want = suits, "Generating missing suites");
            self.gen(shape, suits - count, true)?;
        }
        (0..suits)
            .map(|idx| Self::load_one(&self.suite_path(shape, idx)))
            .collect()
    }

    /// Load suite `idx` of `shape`, generating suites up to it if missing.
    pub fn load_suite(&mut self, shape: SuiteShape, idx: usize) -> Result<Dataset> {
        let count = Self::suite_count(&self.suite_dir(shape))?;
        if idx >= count {
            info!(have = count, want = idx + 1, "Generating missing suites");
            self.gen(shape, idx + 1 - count, true)?;
        }
        Self::load_one(&self.suite_path(shape, idx))
    }
}
