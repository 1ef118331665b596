use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use judgesim_core::{Config, WeightPolicy};
use judgesim_workload::SuiteShape;

/// Judging workload simulator.
///
/// Generates synthetic judging workloads and replays them through the
/// least-loaded container scheduler. Unset flags fall back to the
/// environment (`.env`, optionally profiled).
#[derive(Parser, Debug)]
#[command(name = "judgesim", version, about = "Judging workload simulator")]
pub struct CliArgs {
    /// Config profile; keys are read as `{PROFILE}_{KEY}` before `{KEY}`
    #[arg(long, global = true, env = "JUDGESIM_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Resolve the env config for the selected profile. Runs after argument
    /// parsing so a malformed env value never blocks `--help`.
    pub fn load_config(&self) -> judgesim_core::Result<Config> {
        match self.profile.as_deref() {
            Some(profile) => Config::for_profile(profile),
            None => Config::from_env(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate dataset suites and save them under the data directory
    Generate(GenerateArgs),
    /// Run one dataset suite through the scheduler and report statistics
    Simulate(SimulateArgs),
}

/// Suite shape and storage, shared by every subcommand.
#[derive(Args, Debug)]
pub struct ShapeArgs {
    /// Number of containers
    #[arg(long)]
    pub containers: Option<usize>,

    /// Number of problems
    #[arg(long)]
    pub problems: Option<usize>,

    /// Number of tasks
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Directory holding dataset suites
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// RNG seed for reproducible generation
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ShapeArgs {
    /// Overlay flags on the env config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(containers) = self.containers {
            config.workload.containers = containers;
        }
        if let Some(problems) = self.problems {
            config.workload.problems = problems;
        }
        if let Some(tasks) = self.tasks {
            config.workload.tasks = tasks;
        }
        if let Some(ref data_dir) = self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if self.seed.is_some() {
            config.workload.seed = self.seed;
        }
    }
}

/// Suite shape of the resolved config.
pub fn shape_of(config: &Config) -> SuiteShape {
    SuiteShape::new(
        config.workload.containers,
        config.workload.problems,
        config.workload.tasks,
    )
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub shape: ShapeArgs,

    /// Number of suites to generate
    #[arg(long)]
    pub suits: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub shape: ShapeArgs,

    /// Index of the suite to run (generated if missing)
    #[arg(long, default_value_t = 0)]
    pub suit: usize,

    /// Weight accounting: backlog or cumulative
    #[arg(long)]
    pub weight_policy: Option<WeightPolicy>,

    /// Allow any container regardless of memory capacity
    #[arg(long)]
    pub no_capacity_check: bool,

    /// Wall-clock milliseconds slept per unit of exec_time
    #[arg(long)]
    pub time_scale: Option<f64>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl SimulateArgs {
    pub fn apply(&self, config: &mut Config) {
        self.shape.apply(config);
        if let Some(policy) = self.weight_policy {
            config.scheduler.weight_policy = policy;
        }
        if self.no_capacity_check {
            config.scheduler.capacity_aware = false;
        }
        if let Some(time_scale) = self.time_scale {
            config.scheduler.time_scale = time_scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            profile: String::new(),
            storage: judgesim_core::config::StorageConfig { data_dir: PathBuf::from("data") },
            workload: Default::default(),
            scheduler: Default::default(),
        }
    }

    #[test]
    fn simulate_flags_override_config() {
        let args = CliArgs::parse_from([
            "judgesim",
            "simulate",
            "--containers",
            "8",
            "--weight-policy",
            "cumulative",
            "--no-capacity-check",
            "--suit",
            "2",
        ]);
        let Command::Simulate(sim) = args.command else {
            panic!("expected simulate");
        };
        let mut config = config();
        sim.apply(&mut config);

        assert_eq!(sim.suit, 2);
        assert_eq!(config.workload.containers, 8);
        assert_eq!(config.workload.tasks, 100);
        assert_eq!(config.scheduler.weight_policy, WeightPolicy::Cumulative);
        assert!(!config.scheduler.capacity_aware);
    }

    #[test]
    fn generate_flags_override_config() {
        let args = CliArgs::parse_from([
            "judgesim", "generate", "--tasks", "500", "--suits", "3", "--seed", "9",
        ]);
        let Command::Generate(generate) = args.command else {
            panic!("expected generate");
        };
        let mut config = config();
        generate.shape.apply(&mut config);

        assert_eq!(generate.suits, Some(3));
        assert_eq!(shape_of(&config), SuiteShape::new(4, 10, 500));
        assert_eq!(config.workload.seed, Some(9));
    }

    #[test]
    fn profile_flag_selects_profiled_keys() {
        std::env::set_var("JSCLITEST_SIM_PROBLEMS", "7");
        let args = CliArgs::parse_from(["judgesim", "generate", "--profile", "jsclitest"]);
        assert_eq!(args.profile.as_deref(), Some("jsclitest"));
        let config = args.load_config().unwrap();
        assert_eq!(config.profile, "JSCLITEST");
        assert_eq!(config.workload.problems, 7);
        std::env::remove_var("JSCLITEST_SIM_PROBLEMS");
    }

    #[test]
    fn malformed_env_fails_config_not_parsing() {
        std::env::set_var("JSBADCLI_SCHED_TIME_SCALE", "fast");
        let args = CliArgs::try_parse_from(["judgesim", "--profile", "jsbadcli", "simulate"])
            .unwrap();
        assert!(matches!(args.command, Command::Simulate(_)));
        let err = args.load_config().unwrap_err();
        assert!(err.to_string().contains("SCHED_TIME_SCALE"));
        std::env::remove_var("JSBADCLI_SCHED_TIME_SCALE");
    }

    #[test]
    fn unknown_weight_policy_is_rejected() {
        assert!(CliArgs::try_parse_from(["judgesim", "simulate", "--weight-policy", "fifo"]).is_err());
    }
}
