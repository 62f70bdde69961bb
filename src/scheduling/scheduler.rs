use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{
    DaySchedule, DefaultBreakPolicy, DefaultLunchPolicy, DefaultShiftPolicy, DemandCurve,
    DemandMetrics, ScheduleRequest, WeeklyDemand, WeeklySchedule, WeeklyScheduleRequest,
};
use crate::error::{ScheduleError, ScheduleResult};

use super::candidate::CandidateGenerator;
use super::cp::{CpSolver, CpSolverStats, SolverConfig, SolverStatus, SolverType};
use super::heuristic::{HeuristicSolver, HeuristicStats};
use super::weekly::{DaySolverStats, WeeklyCoordinator};

fn validate_request(request: &ScheduleRequest) -> ScheduleResult<()> {
    if request.workers.is_empty() {
        return Err(ScheduleError::EmptyWorkerSet);
    }
    if request.day_end_minutes <= request.day_start_minutes {
        return Err(ScheduleError::InvalidConfig(
            "day_end_minutes must be after day_start_minutes".into(),
        ));
    }
    Ok(())
}

/// Solves a single day with the greedy heuristic solver, using the
/// default shift/lunch/break policies.
pub fn solve_day(request: &ScheduleRequest) -> ScheduleResult<(DaySchedule, HeuristicStats)> {
    validate_request(request)?;

    let shift_policy = DefaultShiftPolicy::default();
    let lunch_policy = DefaultLunchPolicy::default();
    let break_policy = DefaultBreakPolicy::default();

    let generator = CandidateGenerator::new(&shift_policy, &lunch_policy, &break_policy);
    let candidates = generator.generate_all(request, request.step_slots);

    let solver = HeuristicSolver::new(&shift_policy, &lunch_policy, &break_policy);
    info!(date = %request.schedule_date, workers = request.workers.len(), "solving day with heuristic solver");
    Ok(solver.solve(request, &candidates))
}

/// Solves a single day via the constraint-programming formulation,
/// falling back to the heuristic solver for lunch/break/role placement.
/// `demand_curve`, when supplied, drives the solver's coverage targets;
/// without one the CP pass only enforces "at most one shift per worker".
pub fn solve_day_cp(
    request: &ScheduleRequest,
    demand_curve: Option<DemandCurve>,
    config: SolverConfig,
) -> ScheduleResult<(Option<DaySchedule>, SolverStatus, CpSolverStats)> {
    validate_request(request)?;

    let shift_policy = DefaultShiftPolicy::default();
    let lunch_policy = DefaultLunchPolicy::default();
    let break_policy = DefaultBreakPolicy::default();

    let generator = CandidateGenerator::new(&shift_policy, &lunch_policy, &break_policy);
    let candidates = generator.generate_all(request, request.step_slots);

    let heuristic = HeuristicSolver::new(&shift_policy, &lunch_policy, &break_policy);
    let cp_solver = CpSolver::new(config, &heuristic);
    info!(date = %request.schedule_date, workers = request.workers.len(), "solving day with CP solver");
    Ok(cp_solver.solve(request, &candidates, demand_curve.as_ref()))
}

/// Solves a full week: day-by-day coordination, days-off pattern
/// enforcement, and fairness balancing. `demand` supplies per-date
/// coverage targets; `solver_type` selects HEURISTIC, CPSAT, or HYBRID
/// routing for each day. Returns the produced schedule, per-date demand
/// match metrics, per-date solver stats, and an overall demand-weighted
/// match score.
pub fn solve_week(
    request: &WeeklyScheduleRequest,
    demand: Option<WeeklyDemand>,
    solver_type: SolverType,
) -> ScheduleResult<(
    WeeklySchedule,
    HashMap<NaiveDate, DemandMetrics>,
    HashMap<NaiveDate, DaySolverStats>,
    f64,
)> {
    if request.workers.is_empty() {
        return Err(ScheduleError::EmptyWorkerSet);
    }
    if request.end_date < request.start_date {
        return Err(ScheduleError::InvalidDateRange {
            start: request.start_date,
            end: request.end_date,
        });
    }

    let shift_policy = DefaultShiftPolicy::default();
    let lunch_policy = DefaultLunchPolicy::default();
    let break_policy = DefaultBreakPolicy::default();

    let coordinator = WeeklyCoordinator::new(&shift_policy, &lunch_policy, &break_policy);
    info!(start = %request.start_date, end = %request.end_date, workers = request.workers.len(), "solving week");
    Ok(coordinator.solve_week(request, demand.as_ref(), solver_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Worker;
    use chrono::NaiveDate;

    #[test]
    fn solve_day_rejects_empty_worker_set() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let request = ScheduleRequest::new(date, vec![]);
        assert!(matches!(solve_day(&request), Err(ScheduleError::EmptyWorkerSet)));
    }

    #[test]
    fn solve_day_schedules_a_single_worker() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, crate::domain::Availability::window(12, 44));
        let request = ScheduleRequest::new(date, vec![worker]);
        let (day, stats) = solve_day(&request).unwrap();
        assert_eq!(stats.workers_scheduled, 1);
        assert!(day.assignments.contains_key("w1"));
    }

    #[test]
    fn solve_day_cp_schedules_a_single_worker() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, crate::domain::Availability::window(12, 44));
        let request = ScheduleRequest::new(date, vec![worker]);
        let (day, status, _stats) = solve_day_cp(&request, None, SolverConfig::default()).unwrap();
        assert_eq!(status, SolverStatus::Optimal);
        assert!(day.unwrap().assignments.contains_key("w1"));
    }

    #[test]
    fn solve_week_rejects_inverted_date_range() {
        use crate::domain::{CapTable, DaysOffPattern, FairnessConfig};
        use std::collections::HashSet;

        let start = NaiveDate::from_ymd_opt(2026, 1, 11).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let request = crate::domain::WeeklyScheduleRequest {
            start_date: start,
            end_date: end,
            workers: vec![Worker::new("w1", "Ann")],
            day_start_minutes: 300,
            day_end_minutes: 1320,
            slot_minutes: 15,
            role_caps: CapTable::default(),
            busy_days: HashSet::new(),
            days_off_pattern: DaysOffPattern::None,
            required_days_off: 0,
            fairness_config: FairnessConfig::default(),
            step_slots: 2,
        };
        let result = solve_week(&request, None, SolverType::Heuristic);
        assert!(matches!(result, Err(ScheduleError::InvalidDateRange { .. })));
    }
}
