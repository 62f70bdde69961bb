use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use crate::domain::{
    BreakPolicy, DaysOffPattern, DemandMetrics, FairnessConfig, LunchPolicy, ShiftPolicy,
    WeeklyDemand, WeeklySchedule, WeeklyScheduleRequest, Worker,
};

use super::candidate::CandidateGenerator;
use super::cp::{CpSolver, CpSolverStats, SolverConfig, SolverStatus, SolverType};
use super::heuristic::{HeuristicSolver, HeuristicStats};

/// Running per-worker totals the coordinator carries across the week.
#[derive(Debug, Clone, Default)]
pub struct WorkerWeeklyState {
    pub minutes_worked: u32,
    pub days_worked: Vec<NaiveDate>,
    pub days_off: Vec<NaiveDate>,
}

/// Input to a days-off pattern decision for one worker on one date.
pub struct DaysOffContext<'a> {
    pub worker_id: &'a str,
    pub date: NaiveDate,
    pub day_index: usize,
    pub days_in_week: usize,
    pub state: &'a WorkerWeeklyState,
    pub required_days_off: u32,
}

/// A pluggable rule deciding whether a worker must be off on a given date.
/// The four built-in patterns cover `NONE`/`TWO_CONSECUTIVE`/
/// `ONE_WEEKEND_DAY`/`EVERY_OTHER_DAY`; `CUSTOM` lets a caller supply its
/// own implementation through [`WeeklyCoordinator::with_custom_enforcer`].
pub trait DaysOffPatternEnforcer: Send + Sync {
    fn is_required_off(&self, ctx: &DaysOffContext) -> bool;
}

struct NonePatternEnforcer;
impl DaysOffPatternEnforcer for NonePatternEnforcer {
    fn is_required_off(&self, _ctx: &DaysOffContext) -> bool {
        false
    }
}

/// Once a worker's first off day is taken, the next calendar day must also
/// be off, until `required_days_off` off days have been granted.
struct TwoConsecutiveEnforcer;
impl DaysOffPatternEnforcer for TwoConsecutiveEnforcer {
    fn is_required_off(&self, ctx: &DaysOffContext) -> bool {
        if ctx.state.days_off.len() as u32 >= ctx.required_days_off {
            return false;
        }
        let yesterday = ctx.date.pred_opt();
        let took_yesterday_off = yesterday.map(|d| ctx.state.days_off.last() == Some(&d)).unwrap_or(false);
        took_yesterday_off && ctx.state.days_off.len() % 2 == 1
    }
}

/// Guarantees at least one weekend day off per week: Sunday is a
/// mandatory backstop if Saturday was not already taken.
struct OneWeekendDayEnforcer;
impl DaysOffPatternEnforcer for OneWeekendDayEnforcer {
    fn is_required_off(&self, ctx: &DaysOffContext) -> bool {
        if ctx.date.weekday() != Weekday::Sun {
            return false;
        }
        !ctx.state.days_off.iter().any(|d| {
            matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
        })
    }
}

/// Alternates worked/off days starting from the first day of the window,
/// until `required_days_off` off days have been granted.
struct EveryOtherDayEnforcer;
impl DaysOffPatternEnforcer for EveryOtherDayEnforcer {
    fn is_required_off(&self, ctx: &DaysOffContext) -> bool {
        if ctx.state.days_off.len() as u32 >= ctx.required_days_off {
            return false;
        }
        ctx.day_index % 2 == 1
    }
}

/// Per-date solver stats, tagged by which backend actually ran that day.
/// HYBRID days report `Cp` when the CP pass succeeds and `Heuristic` when
/// it falls back.
#[derive(Debug, Clone)]
pub enum DaySolverStats {
    Heuristic(HeuristicStats),
    Cp { status: SolverStatus, stats: CpSolverStats },
}

struct FairnessBalancer<'a> {
    config: &'a FairnessConfig,
}

impl<'a> FairnessBalancer<'a> {
    /// Orders `worker_ids` by descending priority for an optional rest
    /// day: whoever has worked the most minutes and days so far comes
    /// first.
    fn rank_for_day_off(&self, states: &HashMap<String, WorkerWeeklyState>, worker_ids: &[String]) -> Vec<String> {
        let mut ranked = worker_ids.to_vec();
        ranked.sort_by(|a, b| {
            let score = |id: &str| -> f64 {
                let s = &states[id];
                self.config.weight_hours_balance * s.minutes_worked as f64
                    + self.config.weight_days_balance * s.days_worked.len() as f64 * 60.0
            };
            score(b).partial_cmp(&score(a)).unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    fn compute_metrics(&self, week: &WeeklySchedule) -> crate::domain::FairnessMetrics {
        let minutes_by_worker = week.weekly_minutes_by_worker();
        let days_by_worker = week.days_worked_by_worker();
        let days_worked_by_worker: HashMap<String, u32> = days_by_worker
            .iter()
            .map(|(id, dates)| (id.clone(), dates.len() as u32))
            .collect();

        let values: Vec<u32> = minutes_by_worker.values().copied().collect();
        let avg = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<u32>() as f64 / values.len() as f64
        };
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        let variance = if values.is_empty() {
            0.0
        } else {
            values.iter().map(|v| (*v as f64 - avg).powi(2)).sum::<f64>() / values.len() as f64
        };

        crate::domain::FairnessMetrics {
            avg_weekly_minutes: avg,
            min_weekly_minutes: min,
            max_weekly_minutes: max,
            hours_variance_minutes: variance.sqrt(),
            minutes_by_worker,
            days_worked_by_worker,
        }
    }
}

/// Drives the day-by-day scheduling loop across a date range: picks which
/// workers are off each day per the configured pattern and running
/// fairness state, then delegates to [`HeuristicSolver`] for the day's
/// shift/lunch/break/role placement.
pub struct WeeklyCoordinator<'a> {
    pub shift_policy: &'a dyn ShiftPolicy,
    pub lunch_policy: &'a dyn LunchPolicy,
    pub break_policy: &'a dyn BreakPolicy,
    custom_enforcer: Option<Arc<dyn DaysOffPatternEnforcer>>,
}

impl<'a> WeeklyCoordinator<'a> {
    pub fn new(shift_policy: &'a dyn ShiftPolicy, lunch_policy: &'a dyn LunchPolicy, break_policy: &'a dyn BreakPolicy) -> Self {
        Self {
            shift_policy,
            lunch_policy,
            break_policy,
            custom_enforcer: None,
        }
    }

    pub fn with_custom_enforcer(mut self, enforcer: Arc<dyn DaysOffPatternEnforcer>) -> Self {
        self.custom_enforcer = Some(enforcer);
        self
    }

    fn enforcer_for(&self, pattern: DaysOffPattern) -> Arc<dyn DaysOffPatternEnforcer> {
        match pattern {
            DaysOffPattern::None => Arc::new(NonePatternEnforcer),
            DaysOffPattern::TwoConsecutive => Arc::new(TwoConsecutiveEnforcer),
            DaysOffPattern::OneWeekendDay => Arc::new(OneWeekendDayEnforcer),
            DaysOffPattern::EveryOtherDay => Arc::new(EveryOtherDayEnforcer),
            DaysOffPattern::Custom => self
                .custom_enforcer
                .clone()
                .unwrap_or_else(|| Arc::new(NonePatternEnforcer)),
        }
    }

    /// Coordinates a full week. `demand`, when present, supplies a
    /// per-date coverage target used both to route CP solves and to score
    /// the resulting schedule; `solver_type` selects which backend runs
    /// each day (HYBRID tries CP first and falls back to the heuristic
    /// solver when the CP pass comes back infeasible or without a demand
    /// curve to optimize against).
    pub fn solve_week(
        &self,
        request: &WeeklyScheduleRequest,
        demand: Option<&WeeklyDemand>,
        solver_type: SolverType,
    ) -> (WeeklySchedule, HashMap<NaiveDate, DemandMetrics>, HashMap<NaiveDate, DaySolverStats>, f64) {
        let dates = request.dates();
        let enforcer = self.enforcer_for(request.days_off_pattern);
        let balancer = FairnessBalancer {
            config: &request.fairness_config,
        };

        let mut states: HashMap<String, WorkerWeeklyState> = request
            .workers
            .iter()
            .map(|w| (w.id.clone(), WorkerWeeklyState::default()))
            .collect();

        let mut week = WeeklySchedule::new(request.start_date, request.end_date);
        let mut demand_metrics_by_date: HashMap<NaiveDate, DemandMetrics> = HashMap::new();
        let mut solver_stats_by_date: HashMap<NaiveDate, DaySolverStats> = HashMap::new();

        let generator = CandidateGenerator::new(self.shift_policy, self.lunch_policy, self.break_policy);
        let heuristic = HeuristicSolver::new(self.shift_policy, self.lunch_policy, self.break_policy);
        let cp_solver = CpSolver::new(SolverConfig::default(), &heuristic);

        let min_work_minutes = self.shift_policy.min_work_minutes();

        for (day_index, date) in dates.iter().enumerate() {
            let mut off_today: HashSet<String> = HashSet::new();
            let mut fairness_deferred: HashSet<String> = HashSet::new();

            for worker in &request.workers {
                let state = &states[&worker.id];
                let ctx = DaysOffContext {
                    worker_id: &worker.id,
                    date: *date,
                    day_index,
                    days_in_week: dates.len(),
                    state,
                    required_days_off: request.required_days_off,
                };
                if enforcer.is_required_off(&ctx) {
                    off_today.insert(worker.id.clone());
                }
            }

            let remaining_days = dates.len() - day_index;
            for worker in &request.workers {
                if off_today.contains(&worker.id) {
                    continue;
                }
                let state = &states[&worker.id];
                let remaining_required = (request.required_days_off as usize).saturating_sub(state.days_off.len());
                if remaining_required >= remaining_days {
                    off_today.insert(worker.id.clone());
                }
            }

            // Skip workers who can no longer fit a minimum-length shift within
            // their remaining weekly budget; this is a hard cap, not a deferral.
            for worker in &request.workers {
                if off_today.contains(&worker.id) {
                    continue;
                }
                let state = &states[&worker.id];
                let remaining = worker.max_minutes_per_week.saturating_sub(state.minutes_worked);
                if remaining < min_work_minutes {
                    off_today.insert(worker.id.clone());
                }
            }

            if let Some(target) = request.fairness_config.target_weekly_minutes {
                let mut over_target: Vec<String> = Vec::new();
                for worker in &request.workers {
                    if off_today.contains(&worker.id) {
                        continue;
                    }
                    let state = &states[&worker.id];
                    if state.minutes_worked as f64 >= target as f64 + request.fairness_config.max_hours_variance {
                        over_target.push(worker.id.clone());
                    }
                }
                let ranked = balancer.rank_for_day_off(&states, &over_target);
                debug!(date = %date, over_target = ranked.len(), "fairness rest-day candidates");
                for worker_id in ranked {
                    fairness_deferred.insert(worker_id);
                }
            }

            let day_workers: Vec<Worker> = request
                .workers
                .iter()
                .filter(|w| !off_today.contains(&w.id) && !fairness_deferred.contains(&w.id))
                .cloned()
                .map(|mut w| {
                    let state = &states[&w.id];
                    let remaining = w.max_minutes_per_week.saturating_sub(state.minutes_worked);
                    w.max_minutes_per_day = w.max_minutes_per_day.min(remaining);
                    w
                })
                .collect();

            let day_request = request.day_request_for(*date, day_workers);
            let candidates = generator.generate_all(&day_request, day_request.step_slots);

            let day_demand = demand.and_then(|d| {
                d.demand_for_date(*date, day_request.day_start_minutes, day_request.slot_minutes, day_request.total_slots())
            });

            let (day_schedule, day_stats) = match solver_type {
                SolverType::Heuristic => {
                    let (schedule, stats) = heuristic.solve(&day_request, &candidates);
                    (schedule, DaySolverStats::Heuristic(stats))
                }
                SolverType::Cpsat => {
                    let (schedule, status, stats) = cp_solver.solve(&day_request, &candidates, day_demand.as_ref());
                    let schedule = schedule.unwrap_or_else(|| {
                        heuristic.solve(&day_request, &candidates).0
                    });
                    (schedule, DaySolverStats::Cp { status, stats })
                }
                SolverType::Hybrid => {
                    let (schedule, status, stats) = cp_solver.solve(&day_request, &candidates, day_demand.as_ref());
                    match schedule {
                        Some(schedule) if status == SolverStatus::Optimal || status == SolverStatus::Feasible => {
                            (schedule, DaySolverStats::Cp { status, stats })
                        }
                        _ => {
                            debug!(date = %date, "CP pass infeasible, falling back to heuristic solver");
                            let (schedule, stats) = heuristic.solve(&day_request, &candidates);
                            (schedule, DaySolverStats::Heuristic(stats))
                        }
                    }
                }
            };

            if let Some(curve) = &day_demand {
                let metrics = DemandMetrics::calculate(curve, &day_schedule.coverage_timeline(), day_request.slot_minutes);
                demand_metrics_by_date.insert(*date, metrics);
            }
            solver_stats_by_date.insert(*date, day_stats);

            for (worker_id, assignment) in &day_schedule.assignments {
                if let Some(state) = states.get_mut(worker_id) {
                    state.minutes_worked += assignment.work_minutes();
                    state.days_worked.push(*date);
                }
            }
            for worker in &request.workers {
                if !day_schedule.assignments.contains_key(&worker.id) && !fairness_deferred.contains(&worker.id) {
                    if let Some(state) = states.get_mut(&worker.id) {
                        state.days_off.push(*date);
                    }
                }
            }

            week.days.insert(*date, day_schedule);
        }

        week.fairness_metrics = Some(balancer.compute_metrics(&week));

        let overall_match_score = if demand_metrics_by_date.is_empty() {
            100.0
        } else {
            let total_demand: f64 = demand_metrics_by_date.values().map(|m| m.total_demand_minutes as f64).sum();
            if total_demand == 0.0 {
                100.0
            } else {
                demand_metrics_by_date
                    .values()
                    .map(|m| m.match_score * m.total_demand_minutes as f64)
                    .sum::<f64>()
                    / total_demand
            }
        };

        (week, demand_metrics_by_date, solver_stats_by_date, overall_match_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, CapTable, DefaultBreakPolicy, DefaultLunchPolicy, DefaultShiftPolicy};

    fn week_request(pattern: DaysOffPattern, required_days_off: u32) -> WeeklyScheduleRequest {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 11).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        let mut d = start;
        while d <= end {
            worker.availability.insert(d, Availability::window(12, 44));
            d = d.succ_opt().unwrap();
        }
        WeeklyScheduleRequest {
            start_date: start,
            end_date: end,
            workers: vec![worker],
            day_start_minutes: 300,
            day_end_minutes: 1320,
            slot_minutes: 15,
            role_caps: CapTable::default(),
            busy_days: HashSet::new(),
            days_off_pattern: pattern,
            required_days_off,
            fairness_config: FairnessConfig::default(),
            step_slots: 2,
        }
    }

    #[test]
    fn every_other_day_produces_required_rest_days() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let coordinator = WeeklyCoordinator::new(&sp, &lp, &bp);

        let request = week_request(DaysOffPattern::EveryOtherDay, 2);
        let (week, _demand_metrics, solver_stats, _match_score) =
            coordinator.solve_week(&request, None, SolverType::Heuristic);

        assert_eq!(solver_stats.len(), 7);
        let worked_days = week.days.values().filter(|d| d.assignments.contains_key("w1")).count();
        assert!(worked_days <= 6);
        assert!(week.fairness_metrics.is_some());
    }

    #[test]
    fn one_weekend_day_pattern_forces_sunday_off_if_unused() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let coordinator = WeeklyCoordinator::new(&sp, &lp, &bp);

        let request = week_request(DaysOffPattern::OneWeekendDay, 1);
        let (week, _demand_metrics, _solver_stats, _match_score) =
            coordinator.solve_week(&request, None, SolverType::Heuristic);

        let sunday = NaiveDate::from_ymd_opt(2026, 1, 11).unwrap();
        let sunday_schedule = week.days.get(&sunday).unwrap();
        assert!(!sunday_schedule.assignments.contains_key("w1"));
    }

    #[test]
    fn hybrid_solver_produces_demand_metrics_for_every_date() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let coordinator = WeeklyCoordinator::new(&sp, &lp, &bp);

        let request = week_request(DaysOffPattern::None, 0);
        let total_slots = (request.day_end_minutes - request.day_start_minutes) / request.slot_minutes;
        let demand = WeeklyDemand::standard_week(request.start_date, request.day_start_minutes, request.slot_minutes, total_slots);

        let (week, demand_metrics, solver_stats, match_score) =
            coordinator.solve_week(&request, Some(&demand), SolverType::Hybrid);

        assert_eq!(week.days.len(), 7);
        assert_eq!(solver_stats.len(), 7);
        assert!(!demand_metrics.is_empty());
        assert!(match_score >= 0.0);
    }

    #[test]
    fn worker_under_weekly_minimum_budget_gets_no_shifts() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let coordinator = WeeklyCoordinator::new(&sp, &lp, &bp);

        let mut request = week_request(DaysOffPattern::None, 0);
        // below DefaultShiftPolicy's min_work_minutes (240), so no day can ever fit a shift.
        request.workers[0].max_minutes_per_week = 100;

        let (week, _demand_metrics, _solver_stats, _match_score) =
            coordinator.solve_week(&request, None, SolverType::Heuristic);

        let worked_days = week.days.values().filter(|d| d.assignments.contains_key("w1")).count();
        assert_eq!(worked_days, 0);
    }
}
