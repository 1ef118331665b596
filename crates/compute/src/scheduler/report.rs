use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use judgesim_core::ContainerId;

use super::container::Container;

/// Final numbers of one container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    pub container_id: ContainerId,
    pub machine_id: Option<u64>,
    pub memory: u64,
    pub finished: u64,
    pub time_cost: f64,
    /// Tasks ever assigned.
    pub task_count: u64,
    /// Weight at report time.
    pub weight: f64,
}

/// Cross-container rollup of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub containers: Vec<ContainerReport>,
    pub total_finished: u64,
    pub total_time_cost: f64,
    /// Largest per-container `time_cost`.
    pub makespan: f64,
    pub mean_time_cost: f64,
    /// `makespan / mean_time_cost`; 1.0 is perfectly even, and also reported
    /// when nothing ran.
    pub imbalance: f64,
}

impl SimulationReport {
    pub fn from_containers(containers: &[Arc<Container>]) -> Self {
        let containers: Vec<ContainerReport> = containers
            .iter()
            .map(|c| {
                let statistic = c.statistic();
                ContainerReport {
                    container_id: c.id(),
                    machine_id: c.spec().machine_id,
                    memory: c.spec().memory,
                    finished: statistic.finished,
                    time_cost: statistic.time_cost,
                    task_count: c.task_count(),
                    weight: c.current_weight(),
                }
            })
            .collect();

        let total_finished = containers.iter().map(|c| c.finished).sum();
        let total_time_cost: f64 = containers.iter().map(|c| c.time_cost).sum();
        let makespan = containers.iter().map(|c| c.time_cost).fold(0.0, f64::max);
        let mean_time_cost = if containers.is_empty() {
            0.0
        } else {
            total_time_cost / containers.len() as f64
        };
        let imbalance = if mean_time_cost > 0.0 { makespan / mean_time_cost } else { 1.0 };

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            containers,
            total_finished,
            total_time_cost,
            makespan,
            mean_time_cost,
            imbalance,
        }
    }

    /// Log the report, one line per container.
    pub fn log_summary(&self) {
        tracing::info!(
            "Run {}: {} tasks, total time_cost={:.1}, makespan={:.1}, imbalance={:.3}",
            self.run_id,
            self.total_finished,
            self.total_time_cost,
            self.makespan,
            self.imbalance,
        );
        for c in &self.containers {
            tracing::info!(
                "  container {:>3}: finished={:>5} time_cost={:>10.1} assigned={:>5}",
                c.container_id,
                c.finished,
                c.time_cost,
                c.task_count,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use judgesim_core::{ContainerSpec, JudgeTask, ProblemInfo, WeightPolicy};
    use std::sync::atomic::AtomicBool;

    use super::*;

    fn container_with(id: u64, exec_times: &[f64]) -> Arc<Container> {
        let problem = Arc::new(ProblemInfo::new(0, 0.5, 0.5, 100, 1024).unwrap());
        let c = Arc::new(Container::new(ContainerSpec::new(id, 4096), WeightPolicy::Backlog));
        c.enqueue(
            exec_times
                .iter()
                .enumerate()
                .map(|(i, t)| JudgeTask::for_problem(i as u64, &problem, "", *t, 1)),
        );
        c.run_loop(&AtomicBool::new(false), 0.0);
        c
    }

    #[test]
    fn rollup_totals_and_makespan() {
        let containers = vec![container_with(0, &[10.0, 20.0]), container_with(1, &[10.0])];
        let report = SimulationReport::from_containers(&containers);

        assert_eq!(report.total_finished, 3);
        assert_eq!(report.total_time_cost, 40.0);
        assert_eq!(report.makespan, 30.0);
        assert_eq!(report.mean_time_cost, 20.0);
        assert_eq!(report.imbalance, 1.5);
        assert_eq!(report.containers[1].task_count, 1);
    }

    #[test]
    fn idle_run_reports_even_balance() {
        let containers = vec![container_with(0, &[]), container_with(1, &[])];
        let report = SimulationReport::from_containers(&containers);
        assert_eq!(report.total_finished, 0);
        assert_eq!(report.makespan, 0.0);
        assert_eq!(report.imbalance, 1.0);
    }

    #[test]
    fn report_serializes() {
        let report = SimulationReport::from_containers(&[container_with(4, &[5.0])]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["containers"][0]["container_id"], 4);
        assert_eq!(json["total_finished"], 1);
    }
}
