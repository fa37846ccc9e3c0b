//! Command-line entry point.
//!
//! # Responsibility
//! - Exercise `lazyplan_core` end to end from a shell.
//! - Print every result as pretty JSON on stdout; errors go to stderr.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use lazyplan_core::{
    init_logging, EngineConfig, Goal, GoalDecomposer, HistoricalData, IndexConfig, KeyResult,
    RecordType, RiskPredictor, SemanticIndex, Timeframe,
};
use log::info;
use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lazyplan", version, about = "Goal planning, risk prediction and recall")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rolling log files. Logging stays off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GoalArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    description: Option<String>,

    /// Deadline as days from now.
    #[arg(long)]
    deadline_days: Option<i64>,

    /// Planned hours per week.
    #[arg(long)]
    hours_per_week: Option<f64>,
}

impl GoalArgs {
    fn to_goal(&self) -> Result<Goal, Box<dyn Error>> {
        let mut goal = Goal::new(self.title.clone());
        goal.description = self.description.clone();
        goal.time_allocation_target = self.hours_per_week;
        if let Some(days) = self.deadline_days {
            let span = Duration::try_days(days).ok_or("deadline is out of range")?;
            goal.deadline = Some(Utc::now() + span);
        }
        Ok(goal)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    Day,
    Week,
    Month,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the core version.
    Version,

    /// Break a goal into milestones, tasks and time blocks.
    Decompose {
        #[command(flatten)]
        goal: GoalArgs,

        /// Key result title; repeat for several.
        #[arg(long = "key-result")]
        key_results: Vec<String>,
    },

    /// Assess deadline risk for a goal.
    Risk {
        #[command(flatten)]
        goal: GoalArgs,

        /// Current progress fraction.
        #[arg(long, default_value = "0.0")]
        progress: f64,

        /// Weekly progress fractions, oldest first (comma-separated).
        #[arg(long, value_delimiter = ',')]
        velocity: Vec<f64>,
    },

    /// Simulate completion dates for a goal.
    Trajectory {
        #[command(flatten)]
        goal: GoalArgs,

        #[arg(long, default_value = "0.0")]
        progress: f64,

        /// Seed for a reproducible simulation.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Ask a question over records loaded from a JSON file.
    Ask {
        /// JSON array of `{"type": ..., "record": {...}}` items.
        #[arg(long)]
        records: PathBuf,

        #[arg(long)]
        question: String,
    },

    /// Summarize records loaded from a JSON file.
    Summary {
        #[arg(long)]
        records: PathBuf,

        #[arg(long, value_enum, default_value = "week")]
        period: Period,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = &cli.log_dir {
        init_logging(&cli.log_level, &dir.to_string_lossy())?;
    }
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let output = match cli.command {
        Commands::Version => Value::String(lazyplan_core::core_version().to_string()),
        Commands::Decompose { goal, key_results } => {
            let goal = goal.to_goal()?;
            let key_results: Vec<KeyResult> = key_results
                .iter()
                .map(|title| KeyResult::new(goal.id, title.clone()))
                .collect();
            let decomposer = GoalDecomposer::try_new(config.planner)?;
            let plan = decomposer.decompose(&goal, &key_results)?;
            serde_json::to_value(plan)?
        }
        Commands::Risk {
            goal,
            progress,
            velocity,
        } => {
            let goal = goal.to_goal()?;
            let history = HistoricalData {
                weekly_velocity: velocity,
                current_progress: Some(progress),
                ..HistoricalData::default()
            };
            let predictor = RiskPredictor::try_new(config.risk)?;
            let assessment = predictor.assess_goal_risk(&goal, &[], &history);
            serde_json::to_value(assessment)?
        }
        Commands::Trajectory {
            goal,
            progress,
            seed,
        } => {
            let goal = goal.to_goal()?;
            let mut risk = config.risk;
            if seed.is_some() {
                risk.monte_carlo.seed = seed;
            }
            let predictor = RiskPredictor::try_new(risk)?;
            serde_json::to_value(predictor.predict_trajectory(&goal, progress))?
        }
        Commands::Ask { records, question } => {
            let index = load_index(&records, config.index)?;
            serde_json::to_value(index.ask_question(&question, None))?
        }
        Commands::Summary { records, period } => {
            let index = load_index(&records, config.index)?;
            let timeframe = match period {
                Period::Day => Timeframe::Day,
                Period::Week => Timeframe::Week,
                Period::Month => Timeframe::Month,
            };
            Value::String(index.generate_summary(timeframe))
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_index(path: &Path, config: IndexConfig) -> Result<SemanticIndex, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let items: Vec<Value> = serde_json::from_str(&text)?;
    let mut index = SemanticIndex::try_new(config)?;
    let mut skipped = 0usize;
    for item in &items {
        let record_type = item
            .get("type")
            .and_then(Value::as_str)
            .and_then(RecordType::parse);
        match (record_type, item.get("record")) {
            (Some(record_type), Some(record)) => {
                if !index.index_new_data(record, record_type) {
                    skipped += 1;
                }
            }
            _ => skipped += 1,
        }
    }
    info!(
        "event=records_loaded module=core status=ok indexed={} skipped={}",
        index.len(),
        skipped
    );
    Ok(index)
}
