//! Thin demo harness: builds a sample roster in memory, calls the
//! engine's three entry points, and prints a plain-text summary. No
//! persistence; `--output` is accepted and echoed but nothing is
//! written to it.

use std::collections::HashSet;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shift_scheduler::domain::{
    Availability, DaysOffPattern, DefaultBreakPolicy, DefaultLunchPolicy, DefaultShiftPolicy, FairnessConfig,
    Preference, Role, ScheduleRequest, WeeklyDemand, WeeklyScheduleRequest, Worker,
};
use shift_scheduler::output::{PlainTextSummaryWriter, SummaryWriter};
use shift_scheduler::scheduling::{solve_day, solve_day_cp, solve_week, OptimizationMode, SolverConfig, SolverType};
use shift_scheduler::validation::Validator;

#[derive(Parser)]
#[command(name = "shift-scheduler-cli", about = "Demo harness for the scheduling engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Schedule a single busy day with the heuristic solver.
    Demo {
        #[arg(long, default_value_t = 10)]
        count: u32,
        #[arg(long)]
        output: Option<String>,
    },
    /// Schedule a full week with days-off pattern enforcement.
    WeeklyDemo {
        #[arg(long, default_value_t = 10)]
        count: u32,
        #[arg(long)]
        output: Option<String>,
        #[arg(long, default_value_t = 7)]
        days: u32,
        #[arg(long, value_enum, default_value_t = PatternArg::None)]
        pattern: PatternArg,
        #[arg(long, value_enum, default_value_t = VarietyArg::Medium)]
        variety: VarietyArg,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        morning_limit: Option<u32>,
        #[arg(long)]
        day_limit: Option<u32>,
        #[arg(long)]
        closing_limit: Option<u32>,
        #[arg(long, default_value_t = false)]
        realistic: bool,
    },
    /// Schedule a week against a demand curve via the CP/hybrid solver.
    DemandDemo {
        #[arg(long, default_value_t = 10)]
        count: u32,
        #[arg(long)]
        output: Option<String>,
        #[arg(long, value_enum, default_value_t = SolverArg::Hybrid)]
        solver: SolverArg,
        #[arg(long, value_enum, default_value_t = OptimizationArg::Balanced)]
        optimization: OptimizationArg,
        #[arg(long, default_value_t = 30.0)]
        time_limit: f64,
        #[arg(long, value_enum, default_value_t = ProfileArg::Weekday)]
        profile: ProfileArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg {
    None,
    TwoConsecutive,
    OneWeekendDay,
    EveryOtherDay,
}

impl From<PatternArg> for DaysOffPattern {
    fn from(value: PatternArg) -> Self {
        match value {
            PatternArg::None => DaysOffPattern::None,
            PatternArg::TwoConsecutive => DaysOffPattern::TwoConsecutive,
            PatternArg::OneWeekendDay => DaysOffPattern::OneWeekendDay,
            PatternArg::EveryOtherDay => DaysOffPattern::EveryOtherDay,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum VarietyArg {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverArg {
    Heuristic,
    Cpsat,
    Hybrid,
}

impl From<SolverArg> for SolverType {
    fn from(value: SolverArg) -> Self {
        match value {
            SolverArg::Heuristic => SolverType::Heuristic,
            SolverArg::Cpsat => SolverType::Cpsat,
            SolverArg::Hybrid => SolverType::Hybrid,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OptimizationArg {
    MaximizeCoverage,
    MatchDemand,
    MinimizeUndercoverage,
    Balanced,
}

impl From<OptimizationArg> for OptimizationMode {
    fn from(value: OptimizationArg) -> Self {
        match value {
            OptimizationArg::MaximizeCoverage => OptimizationMode::MaximizeCoverage,
            OptimizationArg::MatchDemand => OptimizationMode::MatchDemand,
            OptimizationArg::MinimizeUndercoverage => OptimizationMode::MinimizeUndercoverage,
            OptimizationArg::Balanced => OptimizationMode::Balanced,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Weekday,
    Weekend,
    HighVolume,
}

const DAY_START_MINUTES: u32 = 300;
const DAY_END_MINUTES: u32 = 1320;
const SLOT_MINUTES: u32 = 15;

fn sample_workers(count: u32, seed: u64, variety: VarietyArg, dates: &[NaiveDate]) -> Vec<Worker> {
    let mut rng = StdRng::seed_from_u64(seed);
    let total_slots = (DAY_END_MINUTES - DAY_START_MINUTES) / SLOT_MINUTES;

    let specialized_roles = [Role::GmdSm, Role::ExceptionSm, Role::Staging, Role::Backroom, Role::Sr];

    (0..count)
        .map(|i| {
            let mut worker = Worker::new(format!("w{i}"), format!("Worker {i}"));

            match variety {
                VarietyArg::Low => {}
                VarietyArg::Medium => {
                    if i % 4 == 0 {
                        worker.role_preferences.insert(specialized_roles[i as usize % specialized_roles.len()], Preference::Prefer);
                    }
                }
                VarietyArg::High => {
                    let role = specialized_roles[i as usize % specialized_roles.len()];
                    worker.role_preferences.insert(role, Preference::Prefer);
                    if i % 3 == 0 {
                        worker.forbidden_roles.insert(specialized_roles[(i as usize + 1) % specialized_roles.len()]);
                    }
                }
            }

            for date in dates {
                let start = rng.gen_range(0..total_slots / 3);
                let len = rng.gen_range(total_slots / 2..total_slots - start);
                worker.availability.insert(*date, Availability::window(start, (start + len).min(total_slots)));
            }

            worker
        })
        .collect()
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shift_scheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("a subcommand is required: demo, weekly-demo, demand-demo");
        std::process::exit(1);
    };

    match command {
        Command::Demo { count, output } => run_demo(count, output),
        Command::WeeklyDemo {
            count,
            output,
            days,
            pattern,
            variety,
            seed,
            morning_limit,
            day_limit,
            closing_limit,
            realistic,
        } => run_weekly_demo(count, output, days, pattern, variety, seed, morning_limit, day_limit, closing_limit, realistic),
        Command::DemandDemo {
            count,
            output,
            solver,
            optimization,
            time_limit,
            profile,
        } => run_demand_demo(count, output, solver, optimization, time_limit, profile),
    }
}

fn run_demo(count: u32, output: Option<String>) {
    let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let workers = sample_workers(count, 1, VarietyArg::Medium, std::slice::from_ref(&date));
    let mut request = ScheduleRequest::new(date, workers);
    request.is_busy_day = true;

    match solve_day(&request) {
        Ok((day, stats)) => {
            let shift_policy = DefaultShiftPolicy::default();
            let lunch_policy = DefaultLunchPolicy::default();
            let break_policy = DefaultBreakPolicy::default();
            let validator = Validator::new(&shift_policy, &lunch_policy, &break_policy);
            let validation = validator.validate_day(&day, &request);

            println!("{}", PlainTextSummaryWriter.summarize_day(&day, &validation));
            println!("workers considered: {} scheduled: {}", stats.workers_considered, stats.workers_scheduled);
            echo_output(&output);
        }
        Err(err) => {
            eprintln!("solve_day failed: {err}");
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_weekly_demo(
    count: u32,
    output: Option<String>,
    days: u32,
    pattern: PatternArg,
    variety: VarietyArg,
    seed: u64,
    morning_limit: Option<u32>,
    day_limit: Option<u32>,
    closing_limit: Option<u32>,
    realistic: bool,
) {
    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let end = start + chrono::Duration::days(days as i64 - 1);

    let mut request = WeeklyScheduleRequest {
        start_date: start,
        end_date: end,
        workers: vec![],
        day_start_minutes: DAY_START_MINUTES,
        day_end_minutes: DAY_END_MINUTES,
        slot_minutes: SLOT_MINUTES,
        role_caps: Default::default(),
        busy_days: HashSet::new(),
        days_off_pattern: pattern.into(),
        required_days_off: 2,
        fairness_config: FairnessConfig::default(),
        step_slots: if realistic { 1 } else { 2 },
    };
    request.workers = sample_workers(count, seed, variety, &request.dates());

    if let Some(cap) = morning_limit.or(day_limit).or(closing_limit) {
        request.role_caps.global.insert(Role::GmdSm, cap);
    }

    match solve_week(&request, None, SolverType::Heuristic) {
        Ok((week, _demand_metrics, solver_stats, _match_score)) => {
            let shift_policy = DefaultShiftPolicy::default();
            let lunch_policy = DefaultLunchPolicy::default();
            let break_policy = DefaultBreakPolicy::default();
            let validator = Validator::new(&shift_policy, &lunch_policy, &break_policy);
            let validation = validator.validate_week(&week, &request);

            println!("{}", PlainTextSummaryWriter.summarize_week(&week, &validation));
            println!("days with solver stats recorded: {}", solver_stats.len());
            echo_output(&output);
        }
        Err(err) => {
            eprintln!("solve_week failed: {err}");
            std::process::exit(1);
        }
    }
}

fn run_demand_demo(count: u32, output: Option<String>, solver: SolverArg, optimization: OptimizationArg, time_limit: f64, profile: ProfileArg) {
    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let end = start + chrono::Duration::days(6);

    let mut request = WeeklyScheduleRequest {
        start_date: start,
        end_date: end,
        workers: vec![],
        day_start_minutes: DAY_START_MINUTES,
        day_end_minutes: DAY_END_MINUTES,
        slot_minutes: SLOT_MINUTES,
        role_caps: Default::default(),
        busy_days: HashSet::new(),
        days_off_pattern: DaysOffPattern::None,
        required_days_off: 0,
        fairness_config: FairnessConfig::default(),
        step_slots: 2,
    };
    request.workers = sample_workers(count, 1, VarietyArg::Medium, &request.dates());

    let total_slots = (DAY_END_MINUTES - DAY_START_MINUTES) / SLOT_MINUTES;
    let demand_profile = match profile {
        ProfileArg::Weekday => shift_scheduler::domain::DemandProfile::weekday(),
        ProfileArg::Weekend => shift_scheduler::domain::DemandProfile::weekend(),
        ProfileArg::HighVolume => shift_scheduler::domain::DemandProfile::high_volume(),
    };
    let mut demand_curves = std::collections::HashMap::new();
    for date in request.dates() {
        demand_curves.insert(date, demand_profile.to_demand_curve(date, DAY_START_MINUTES, SLOT_MINUTES, total_slots));
    }
    let demand = WeeklyDemand {
        demand_curves,
        weekday_profile: None,
        weekend_profile: None,
    };

    let config = SolverConfig {
        time_limit_seconds: time_limit,
        optimization_mode: optimization.into(),
        ..SolverConfig::default()
    };

    match solve_day_cp(&request.day_request_for(start, request.workers.clone()), demand.demand_curves.get(&start).cloned(), config.clone()) {
        Ok((Some(day), status, stats)) => {
            println!("single-day CP probe: status={status:?} objective={:.2}", stats.objective_value);
            let _ = day;
        }
        Ok((None, status, _stats)) => {
            println!("single-day CP probe infeasible: status={status:?}");
        }
        Err(err) => {
            eprintln!("solve_day_cp failed: {err}");
            std::process::exit(1);
        }
    }

    match solve_week(&request, Some(demand), solver.into()) {
        Ok((week, demand_metrics, solver_stats, overall_match_score)) => {
            let shift_policy = DefaultShiftPolicy::default();
            let lunch_policy = DefaultLunchPolicy::default();
            let break_policy = DefaultBreakPolicy::default();
            let validator = Validator::new(&shift_policy, &lunch_policy, &break_policy);
            let validation = validator.validate_week(&week, &request);

            println!("{}", PlainTextSummaryWriter.summarize_week(&week, &validation));
            println!("overall demand match score: {overall_match_score:.1}");
            for (date, metrics) in &demand_metrics {
                println!("  {date}: match_score={:.1}", metrics.match_score);
            }
            println!("days with solver stats recorded: {}", solver_stats.len());
            echo_output(&output);
        }
        Err(err) => {
            eprintln!("solve_week failed: {err}");
            std::process::exit(1);
        }
    }
}

fn echo_output(output: &Option<String>) {
    if let Some(path) = output {
        println!("(--output {path} accepted; PDF rendering is out of scope, nothing was written)");
    }
}
