//! Synthetic judging workloads.
//!
//! Each problem gets a TLE-heavy execution time distribution: a
//! `tle_rate` share of its tasks run for exactly the time limit, the rest
//! finish somewhere between half and nine tenths of it.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use judgesim_core::{JudgeTask, ProblemId, ProblemInfo};

use crate::error::{Result, WorkloadError};

/// Default limits of generated problems.
pub const DEFAULT_LIMITED_TIME: u64 = 200;
pub const DEFAULT_LIMITED_MEMORY: u64 = 1024 * 1024;
pub const DEFAULT_MLE_RATE: f64 = 0.5;

/// Execution times for `n` tasks of a problem with TLE rate `p` and time
/// limit `limit`: `floor(p × n)` entries equal `limit`, the rest are uniform
/// in `[0.5 × limit, 0.9 × limit)`, all shuffled.
pub fn exec_time_distribution<R: Rng + ?Sized>(rng: &mut R, p: f64, n: usize, limit: f64) -> Vec<f64> {
    let tle = ((p * n as f64).floor() as usize).min(n);
    let mut times = vec![limit; tle];
    if n > tle && limit > 0.0 {
        let normal = Uniform::new(0.5 * limit, 0.9 * limit);
        times.extend(normal.sample_iter(&mut *rng).take(n - tle));
    } else {
        times.resize(n, limit);
    }
    times.shuffle(rng);
    times
}

/// `n` tasks for `problem`, tids `0..n`, limits copied from the problem.
pub fn tasks_for_problem<R: Rng + ?Sized>(
    rng: &mut R,
    problem: &Arc<ProblemInfo>,
    n: usize,
) -> Vec<JudgeTask> {
    exec_time_distribution(rng, problem.tle_rate, n, problem.limited_time as f64)
        .into_iter()
        .enumerate()
        .map(|(tid, exec_time)| {
            JudgeTask::for_problem(tid as u64, problem, "", exec_time, problem.limited_memory)
        })
        .collect()
}

/// How many tasks each problem gets.
///
/// Explicit `counts` must name known problems and sum to `n`. Without them
/// every problem gets `n / len` and the last one takes the remainder; when
/// `n` is smaller than the number of problems the first `n` get one each.
pub fn plan(
    problems: &[Arc<ProblemInfo>],
    n: usize,
    counts: Option<&BTreeMap<ProblemId, usize>>,
) -> Result<Vec<(Arc<ProblemInfo>, usize)>> {
    if problems.is_empty() {
        return Err(WorkloadError::NoProblems);
    }

    if let Some(counts) = counts {
        let actual: usize = counts.values().sum();
        if actual != n {
            return Err(WorkloadError::CountMismatch { expected: n, actual });
        }
        return counts
            .iter()
            .map(|(id, &count)| {
                problems
                    .iter()
                    .find(|p| p.problem_id == *id)
                    .map(|p| (Arc::clone(p), count))
                    .ok_or(WorkloadError::UnknownProblem(*id))
            })
            .collect();
    }

    let avg = n / problems.len();
    if avg == 0 {
        warn!(problems = problems.len(), tasks = n, "More problems than tasks");
        return Ok(problems.iter().take(n).map(|p| (Arc::clone(p), 1)).collect());
    }

    let last = problems.len() - 1;
    Ok(problems
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let count = if i == last { n - avg * last } else { avg };
            (Arc::clone(p), count)
        })
        .collect())
}

/// Seedable task generator.
pub struct TaskGenerator {
    rng: StdRng,
}

impl Default for TaskGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TaskGenerator {
    /// `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Problems `0..count` with random TLE rates and the given limits.
    pub fn random_problems(
        &mut self,
        count: usize,
        limited_time: u64,
        limited_memory: u64,
    ) -> Result<Vec<Arc<ProblemInfo>>> {
        (0..count as u64)
            .map(|id| {
                let tle_rate: f64 = self.rng.gen();
                ProblemInfo::new(id, tle_rate, DEFAULT_MLE_RATE, limited_time, limited_memory)
                    .map(Arc::new)
                    .map_err(WorkloadError::from)
            })
            .collect()
    }

    /// Tasks for one problem, drawn from this generator's RNG.
    pub fn generate_by_problem(&mut self, problem: &Arc<ProblemInfo>, n: usize) -> Vec<JudgeTask> {
        tasks_for_problem(&mut self.rng, problem, n)
    }

    /// `n` tasks spread over `problems` according to [`plan`].
    ///
    /// Problems are generated in parallel, each from its own RNG seeded by
    /// this generator, so a seeded generator yields the same tasks every run.
    pub fn generate_n_tasks_with_problems(
        &mut self,
        problems: &[Arc<ProblemInfo>],
        n: usize,
        counts: Option<&BTreeMap<ProblemId, usize>>,
    ) -> Result<Vec<JudgeTask>> {
        let plan = plan(problems, n, counts)?;
        let seeds: Vec<u64> = plan.iter().map(|_| self.rng.gen()).collect();

        let per_problem: Vec<Vec<JudgeTask>> = plan
            .par_iter()
            .zip(seeds.par_iter())
            .map(|((problem, count), seed)| {
                let mut rng = StdRng::seed_from_u64(*seed);
                tasks_for_problem(&mut rng, problem, *count)
            })
            .collect();

        let tasks: Vec<JudgeTask> = per_problem.into_iter().flatten().collect();
        debug!(problems = plan.len(), tasks = tasks.len(), "Generated tasks");
        Ok(tasks)
    }

    /// `n` tasks over `problem_count` fresh random problems.
    pub fn generate_n_tasks(&mut self, problem_count: usize, n: usize) -> Result<Vec<JudgeTask>> {
        let problems =
            self.random_problems(problem_count, DEFAULT_LIMITED_TIME, DEFAULT_LIMITED_MEMORY)?;
        self.generate_n_tasks_with_problems(&problems, n, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problems(count: u64) -> Vec<Arc<ProblemInfo>> {
        (0..count)
            .map(|id| Arc::new(ProblemInfo::new(id, 0.4, 0.5, 200, 1024).unwrap()))
            .collect()
    }

    #[test]
    fn distribution_has_exact_tle_share() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = exec_time_distribution(&mut rng, 0.4, 100, 2.0);
        assert_eq!(d.len(), 100);
        assert_eq!(d.iter().filter(|&&t| t == 2.0).count(), 40);
        assert!(d.iter().filter(|&&t| t < 2.0).all(|&t| (1.0..1.8).contains(&t)));
    }

    #[test]
    fn distribution_edges() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(exec_time_distribution(&mut rng, 0.5, 0, 10.0).is_empty());
        assert!(exec_time_distribution(&mut rng, 1.0, 5, 10.0).iter().all(|&t| t == 10.0));
        assert!(exec_time_distribution(&mut rng, 0.0, 5, 10.0).iter().all(|&t| t < 9.0));
    }

    #[test]
    fn generate_by_problem_copies_limits() {
        let mut g = TaskGenerator::new(Some(1));
        let p = Arc::new(ProblemInfo::new(114, 0.45, 0.5, 200, 1_000_000).unwrap());
        let tasks = g.generate_by_problem(&p, 100);
        assert_eq!(tasks.len(), 100);
        assert_eq!(tasks[99].tid, 99);
        assert!(tasks.iter().all(|t| t.limited_time == 200 && t.exec_memory == 1_000_000));
        assert!(tasks.iter().all(|t| t.code.is_empty() && t.problem_id() == 114));
    }

    #[test]
    fn plan_splits_evenly_with_remainder_on_last() {
        let plan = plan(&problems(3), 10, None).unwrap();
        let counts: Vec<usize> = plan.iter().map(|(_, c)| *c).collect();
        assert_eq!(counts, vec![3, 3, 4]);
    }

    #[test]
    fn plan_with_fewer_tasks_than_problems() {
        let plan = plan(&problems(5), 3, None).unwrap();
        let ids: Vec<u64> = plan.iter().map(|(p, _)| p.problem_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(plan.iter().all(|(_, c)| *c == 1));
    }

    #[test]
    fn plan_with_explicit_counts() {
        let counts = BTreeMap::from([(0, 7), (2, 3)]);
        let plan = plan(&problems(3), 10, Some(&counts)).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].0.problem_id, 2);
        assert_eq!(plan[1].1, 3);
    }

    #[test]
    fn plan_rejects_bad_counts() {
        let counts = BTreeMap::from([(0, 7)]);
        assert!(matches!(
            plan(&problems(3), 10, Some(&counts)),
            Err(WorkloadError::CountMismatch { expected: 10, actual: 7 })
        ));
        let counts = BTreeMap::from([(9, 10)]);
        assert!(matches!(
            plan(&problems(3), 10, Some(&counts)),
            Err(WorkloadError::UnknownProblem(9))
        ));
        assert!(matches!(plan(&[], 10, None), Err(WorkloadError::NoProblems)));
    }

    #[test]
    fn generate_n_tasks_count() {
        let mut g = TaskGenerator::new(None);
        assert_eq!(g.generate_n_tasks(10, 100).unwrap().len(), 100);
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = TaskGenerator::new(Some(42)).generate_n_tasks(4, 50).unwrap();
        let b = TaskGenerator::new(Some(42)).generate_n_tasks(4, 50).unwrap();
        let times = |tasks: &[JudgeTask]| -> Vec<(u64, u64, f64)> {
            tasks.iter().map(|t| (t.problem_id(), t.tid, t.exec_time)).collect()
        };
        assert_eq!(times(&a), times(&b));
    }

    #[test]
    fn random_problems_have_valid_rates() {
        let mut g = TaskGenerator::new(Some(3));
        let problems = g.random_problems(20, 200, 1024).unwrap();
        assert_eq!(problems.len(), 20);
        assert!(problems.iter().all(|p| (0.0..1.0).contains(&p.tle_rate)));
        assert_eq!(problems[19].problem_id, 19);
    }
}
