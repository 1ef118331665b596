use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use judgesim_core::{ContainerSpec, JudgeTask, ProblemId, ProblemInfo, TaskId};

use crate::error::{Result, WorkloadError};

/// A task as stored on disk: the problem is referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub tid: TaskId,
    pub problem_id: ProblemId,
    #[serde(default)]
    pub code: String,
    pub limited_time: u64,
    pub limited_memory: u64,
    pub exec_time: f64,
    pub exec_memory: u64,
}

impl From<&JudgeTask> for TaskRecord {
    fn from(task: &JudgeTask) -> Self {
        Self {
            tid: task.tid,
            problem_id: task.problem_id(),
            code: task.code.clone(),
            limited_time: task.limited_time,
            limited_memory: task.limited_memory,
            exec_time: task.exec_time,
            exec_memory: task.exec_memory,
        }
    }
}

/// One generated workload: containers, problems and the ordered task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub containers: Vec<ContainerSpec>,
    pub problems: Vec<ProblemInfo>,
    pub tasks: Vec<TaskRecord>,
}

impl Dataset {
    pub fn new(
        containers: Vec<ContainerSpec>,
        problems: &[Arc<ProblemInfo>],
        tasks: &[JudgeTask],
    ) -> Self {
        Self {
            containers,
            problems: problems.iter().map(|p| p.as_ref().clone()).collect(),
            tasks: tasks.iter().map(TaskRecord::from).collect(),
        }
    }

    /// Resolve task references into shared problems.
    ///
    /// Fails on invalid problem or task records, duplicate problem ids, or a
    /// task naming a problem that is not in the dataset.
    pub fn into_parts(self) -> Result<(Vec<ContainerSpec>, Vec<JudgeTask>)> {
        let mut problems: HashMap<ProblemId, Arc<ProblemInfo>> =
            HashMap::with_capacity(self.problems.len());
        for problem in self.problems {
            problem.validate()?;
            let id = problem.problem_id;
            if problems.insert(id, Arc::new(problem)).is_some() {
                return Err(WorkloadError::DuplicateProblem(id));
            }
        }

        let tasks = self
            .tasks
            .into_iter()
            .map(|record| {
                let problem = problems
                    .get(&record.problem_id)
                    .ok_or(WorkloadError::UnknownProblem(record.problem_id))?;
                let task = JudgeTask {
                    tid: record.tid,
                    problem_info: Arc::clone(problem),
                    code: record.code,
                    limited_time: record.limited_time,
                    limited_memory: record.limited_memory,
                    exec_time: record.exec_time,
                    exec_memory: record.exec_memory,
                };
                task.validate()?;
                Ok(task)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((self.containers, tasks))
    }
}

#[cfg(test)]
mod tests {
    use judgesim_core::JudgeSimError;

    use super::*;

    fn sample() -> Dataset {
        let p = Arc::new(ProblemInfo::new(3, 0.5, 0.5, 200, 1024).unwrap());
        let tasks = vec![
            JudgeTask::for_problem(0, &p, "", 150.0, 1024),
            JudgeTask::for_problem(1, &p, "int main() {}", 200.0, 1024),
        ];
        Dataset::new(vec![ContainerSpec::new(0, 4096)], &[p], &tasks)
    }

    #[test]
    fn into_parts_shares_problems() {
        let (containers, tasks) = sample().into_parts().unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(tasks.len(), 2);
        assert!(Arc::ptr_eq(&tasks[0].problem_info, &tasks[1].problem_info));
        assert_eq!(tasks[1].code, "int main() {}");
    }

    #[test]
    fn unknown_problem_is_rejected() {
        let mut dataset = sample();
        dataset.tasks[1].problem_id = 99;
        assert!(matches!(dataset.into_parts(), Err(WorkloadError::UnknownProblem(99))));
    }

    #[test]
    fn duplicate_problem_is_rejected() {
        let mut dataset = sample();
        dataset.problems.push(dataset.problems[0].clone());
        assert!(matches!(dataset.into_parts(), Err(WorkloadError::DuplicateProblem(3))));
    }

    #[test]
    fn invalid_problem_is_rejected() {
        let mut dataset = sample();
        dataset.problems[0].tle_rate = 3.0;
        assert!(matches!(dataset.into_parts(), Err(WorkloadError::Record(_))));
    }

    #[test]
    fn invalid_exec_time_is_rejected() {
        for exec_time in [-5.0, f64::NAN, f64::INFINITY] {
            let mut dataset = sample();
            dataset.tasks[1].exec_time = exec_time;
            assert!(matches!(
                dataset.into_parts(),
                Err(WorkloadError::Record(JudgeSimError::InvalidTask { tid: 1, .. }))
            ));
        }
    }

    #[test]
    fn task_snapshot_limits_survive_loading() {
        let mut dataset = sample();
        dataset.tasks[0].limited_time = 100;
        let (_, tasks) = dataset.into_parts().unwrap();
        assert_eq!(tasks[0].limited_time, 100);
        assert_eq!(tasks[0].problem_info.limited_time, 200);
    }
}
