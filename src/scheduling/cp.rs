use std::collections::HashMap;

use good_lp::solvers::microlp::microlp;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{
    DaySchedule, DemandCurve, DemandPriority, Role, ScheduleBlock, ScheduleRequest, Worker, UNBOUNDED_CAP,
};

use super::candidate::ShiftCandidate;
use super::heuristic::HeuristicSolver;

/// How the CP objective balances demand match, coverage, fairness, and
/// worker preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationMode {
    MaximizeCoverage,
    MatchDemand,
    MinimizeUndercoverage,
    Balanced,
}

/// Which solver path a day (or week) is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverType {
    Heuristic,
    Cpsat,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Optimal,
    Feasible,
    Infeasible,
    ModelInvalid,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub time_limit_seconds: f64,
    /// 0 lets the backend decide; `microlp` is single-threaded regardless.
    pub num_workers: u32,
    pub optimization_mode: OptimizationMode,
    pub demand_weight: i64,
    pub coverage_weight: i64,
    pub fairness_weight: i64,
    pub preference_weight: i64,
    pub undercoverage_penalty: i64,
    pub overcoverage_penalty: i64,
    pub priority_multipliers: HashMap<DemandPriority, f64>,
    /// When set, `target_staff` becomes a hard per-slot minimum instead of
    /// an objective term.
    pub enforce_min_demand: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: 30.0,
            num_workers: 0,
            optimization_mode: OptimizationMode::Balanced,
            demand_weight: 40,
            coverage_weight: 30,
            fairness_weight: 20,
            preference_weight: 10,
            undercoverage_penalty: 100,
            overcoverage_penalty: 10,
            priority_multipliers: HashMap::new(),
            enforce_min_demand: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CpSolverStats {
    pub objective_value: f64,
    pub wall_time_seconds: f64,
    /// Node/conflict counts as reported by the solver backend. The
    /// pure-Rust `microlp` backend does not expose these; they stay zero.
    pub branches: u64,
    pub conflicts: u64,
}

/// Formulates candidate selection, lunch-start placement, and coverage
/// accounting as a mixed-integer program, then delegates break placement
/// and role assignment to the heuristic solver's phases 3-4. Role
/// *assignment* stays out of the MIP to avoid a slot x role variable
/// explosion; role *caps* are still enforced as hard constraints here.
pub struct CpSolver<'a> {
    pub config: SolverConfig,
    pub heuristic: &'a HeuristicSolver<'a>,
}

impl<'a> CpSolver<'a> {
    pub fn new(config: SolverConfig, heuristic: &'a HeuristicSolver<'a>) -> Self {
        Self { config, heuristic }
    }

    pub fn solve(
        &self,
        request: &ScheduleRequest,
        candidates_by_worker: &HashMap<String, Vec<ShiftCandidate>>,
        demand: Option<&DemandCurve>,
    ) -> (Option<DaySchedule>, SolverStatus, CpSolverStats) {
        let start = std::time::Instant::now();
        let total_slots = request.total_slots();

        let mut entries: Vec<(String, ShiftCandidate)> = Vec::new();
        for (worker_id, candidates) in candidates_by_worker {
            for candidate in candidates {
                entries.push((worker_id.clone(), *candidate));
            }
        }

        if entries.is_empty() {
            let day = DaySchedule::new(request.schedule_date, request.slot_minutes, total_slots);
            return (
                Some(day),
                SolverStatus::Optimal,
                CpSolverStats {
                    wall_time_seconds: start.elapsed().as_secs_f64(),
                    ..Default::default()
                },
            );
        }

        let mut problem_vars = variables!();
        let x: Vec<_> = entries.iter().map(|_| problem_vars.add(variable().binary())).collect();

        let worker_ids: Vec<&String> = {
            let mut ids: Vec<&String> = candidates_by_worker.keys().collect();
            ids.sort();
            ids
        };

        let workers_by_id: HashMap<&str, &Worker> = request.workers.iter().map(|w| (w.id.as_str(), w)).collect();

        // Lunch-start binaries ℓ[w,c,s] and on_floor[w,c,t] auxiliaries, for
        // every candidate that carries a lunch. Candidates with no lunch
        // need neither: on_floor is just x[w,c] wherever they cover a slot.
        let lunch_policy = self.heuristic.lunch_policy;
        let mut lunch_vars = HashMap::new();
        let mut on_floor_vars = HashMap::new();
        let mut lunch_exactly_one: Vec<Expression> = Vec::new();
        let mut on_floor_le_x: Vec<Expression> = Vec::new();
        let mut on_floor_le_complement: Vec<Expression> = Vec::new();
        let mut on_floor_ge_x_minus_lunch: Vec<Expression> = Vec::new();

        for (i, (_worker_id, candidate)) in entries.iter().enumerate() {
            if candidate.lunch_slots == 0 {
                continue;
            }

            let (earliest, latest) = lunch_policy.lunch_window(
                candidate.start_slot,
                candidate.end_slot,
                candidate.lunch_slots,
                request.is_busy_day,
                request.slot_minutes,
            );

            let mut start_vars: Vec<(u32, _)> = Vec::new();
            if earliest <= latest {
                let mut s = earliest;
                while s <= latest {
                    if s + candidate.lunch_slots <= candidate.end_slot {
                        let var = problem_vars.add(variable().binary());
                        lunch_vars.insert((i, s), var);
                        start_vars.push((s, var));
                    }
                    s += 1;
                }
            }

            let mut sum_expr = Expression::from(0.0);
            for (_, v) in &start_vars {
                sum_expr += *v;
            }
            let mut x_expr = Expression::from(0.0);
            x_expr += x[i];
            // Σ_s ℓ[w,c,s] = x[w,c]
            lunch_exactly_one.push(sum_expr - x_expr);

            for t in candidate.start_slot..candidate.end_slot {
                let mut lunch_at_t = Expression::from(0.0);
                for (s, v) in &start_vars {
                    if *s <= t && t < *s + candidate.lunch_slots {
                        lunch_at_t += *v;
                    }
                }

                let on_floor_var = problem_vars.add(variable().binary());
                on_floor_vars.insert((i, t), on_floor_var);

                let mut on_floor_expr = Expression::from(0.0);
                on_floor_expr += on_floor_var;
                let mut x_i_expr = Expression::from(0.0);
                x_i_expr += x[i];

                // on_floor = x[w,c] ∧ ¬(on lunch at t), linearized:
                on_floor_le_x.push(on_floor_expr.clone() - x_i_expr.clone());
                on_floor_le_complement.push(on_floor_expr.clone() + lunch_at_t.clone());
                on_floor_ge_x_minus_lunch.push((on_floor_expr + lunch_at_t) - x_i_expr);
            }
        }

        let preference_lookup: HashMap<&str, i32> = request
            .workers
            .iter()
            .map(|w| (w.id.as_str(), w.preference_balance()))
            .collect();

        let preference_scale = self.config.preference_weight as f64 / 100.0;
        let mut objective = Expression::from(0.0);
        for (i, (worker_id, candidate)) in entries.iter().enumerate() {
            let pref = *preference_lookup.get(worker_id.as_str()).unwrap_or(&0) as f64;
            objective += preference_scale * pref * x[i];

            let length_bonus = candidate.work_minutes as f64 / 60.0;
            objective += length_bonus * x[i];
        }

        let mut under_vars = Vec::with_capacity(total_slots as usize);
        let mut over_vars = Vec::with_capacity(total_slots as usize);
        for _ in 0..total_slots {
            under_vars.push(problem_vars.add(variable().min(0.0)));
            over_vars.push(problem_vars.add(variable().min(0.0)));
        }

        let coverage_scale = self.config.coverage_weight as f64 / 100.0;
        let mut coverage_by_slot: Vec<Expression> = Vec::with_capacity(total_slots as usize);
        for slot in 0..total_slots {
            let mut coverage = Expression::from(0.0);
            for (i, (_worker_id, candidate)) in entries.iter().enumerate() {
                if !candidate.covers(slot) {
                    continue;
                }
                if candidate.lunch_slots > 0 {
                    if let Some(&v) = on_floor_vars.get(&(i, slot)) {
                        coverage += v;
                        objective += coverage_scale * v;
                    }
                } else {
                    coverage += x[i];
                    objective += coverage_scale * x[i];
                }
            }
            coverage_by_slot.push(coverage);
        }

        let undercoverage_scale = self.config.undercoverage_penalty as f64 / 100.0
            * match self.config.optimization_mode {
                OptimizationMode::MinimizeUndercoverage => 1.5,
                OptimizationMode::MatchDemand => 1.0,
                OptimizationMode::MaximizeCoverage => 0.5,
                OptimizationMode::Balanced => 1.0,
            };
        let overcoverage_scale = self.config.overcoverage_penalty as f64 / 100.0;

        for slot in 0..total_slots {
            let priority = demand.map(|d| d.priority_at(slot)).unwrap_or(DemandPriority::Normal);
            let priority_weight = priority.multiplier(&self.config.priority_multipliers);
            objective -= undercoverage_scale * priority_weight * under_vars[slot as usize];
            objective -= overcoverage_scale * over_vars[slot as usize];
        }

        let mut model = problem_vars.maximise(objective).using(microlp);

        for worker_id in &worker_ids {
            let mut at_most_one = Expression::from(0.0);
            for (i, (wid, _)) in entries.iter().enumerate() {
                if wid == *worker_id {
                    at_most_one += x[i];
                }
            }
            model = model.with(constraint!(at_most_one <= 1));
        }

        for expr in lunch_exactly_one {
            model = model.with(constraint!(expr == 0));
        }
        for expr in on_floor_le_x {
            model = model.with(constraint!(expr <= 0));
        }
        for expr in on_floor_le_complement {
            model = model.with(constraint!(expr <= 1));
        }
        for expr in on_floor_ge_x_minus_lunch {
            model = model.with(constraint!(expr >= 0));
        }

        for slot in 0..total_slots {
            let target = demand.map(|d| d.target_staff_at(slot)).unwrap_or(0) as f64;
            let min_required = demand.map(|d| d.min_staff_at(slot)).unwrap_or(0) as f64;
            let coverage = coverage_by_slot[slot as usize].clone();

            let coverage_minus_under = coverage.clone() + under_vars[slot as usize] * 1.0;
            model = model.with(constraint!(coverage_minus_under >= target));
            let coverage_minus_over = coverage.clone() - over_vars[slot as usize] * 1.0;
            model = model.with(constraint!(coverage_minus_over <= target));

            if self.config.enforce_min_demand && min_required > 0.0 {
                model = model.with(constraint!(coverage >= min_required));
            }
        }

        for role in Role::all() {
            for slot in 0..total_slots {
                let cap = request.role_caps.cap_at(slot, role);
                if cap == UNBOUNDED_CAP {
                    continue;
                }
                let mut role_expr = Expression::from(0.0);
                let mut any = false;
                for (i, (worker_id, candidate)) in entries.iter().enumerate() {
                    if !candidate.covers(slot) {
                        continue;
                    }
                    let eligible = workers_by_id.get(worker_id.as_str()).map(|w| w.can_do_role(role)).unwrap_or(false);
                    if !eligible {
                        continue;
                    }
                    role_expr += x[i];
                    any = true;
                }
                if any {
                    model = model.with(constraint!(role_expr <= cap as f64));
                }
            }
        }

        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(err) => {
                warn!(error = %err, "CP solver failed to find a solution");
                return (
                    None,
                    SolverStatus::Infeasible,
                    CpSolverStats {
                        wall_time_seconds: start.elapsed().as_secs_f64(),
                        ..Default::default()
                    },
                );
            }
        };

        let mut selections: Vec<(String, ShiftCandidate, Option<ScheduleBlock>)> = Vec::new();
        for (i, (worker_id, candidate)) in entries.iter().enumerate() {
            if solution.value(x[i]) <= 0.5 {
                continue;
            }

            let lunch_block = if candidate.lunch_slots > 0 {
                let mut chosen_start: Option<u32> = None;
                for t in candidate.start_slot..candidate.end_slot {
                    if let Some(&v) = lunch_vars.get(&(i, t)) {
                        if solution.value(v) > 0.5 {
                            chosen_start = Some(t);
                            break;
                        }
                    }
                }
                chosen_start.map(|s| ScheduleBlock::new(s, s + candidate.lunch_slots))
            } else {
                None
            };

            selections.push((worker_id.clone(), *candidate, lunch_block));
        }

        info!(selected = selections.len(), "CP shift selection complete");

        let (day, _heuristic_stats) = self.heuristic.solve_from_lunch_plan(request, selections);

        let stats = CpSolverStats {
            wall_time_seconds: start.elapsed().as_secs_f64(),
            ..Default::default()
        };

        (Some(day), SolverStatus::Optimal, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, DefaultBreakPolicy, DefaultLunchPolicy, DefaultShiftPolicy, Worker};
    use crate::scheduling::candidate::CandidateGenerator;
    use chrono::NaiveDate;

    #[test]
    fn empty_candidates_yield_empty_schedule() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let heuristic = HeuristicSolver::new(&sp, &lp, &bp);
        let solver = CpSolver::new(SolverConfig::default(), &heuristic);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let request = ScheduleRequest::new(date, vec![]);
        let (day, status, _stats) = solver.solve(&request, &HashMap::new(), None);

        assert!(day.is_some());
        assert_eq!(status, SolverStatus::Optimal);
    }

    #[test]
    fn single_worker_is_selected_when_feasible() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let heuristic = HeuristicSolver::new(&sp, &lp, &bp);
        let solver = CpSolver::new(SolverConfig::default(), &heuristic);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, Availability::window(12, 44));
        let request = ScheduleRequest::new(date, vec![worker.clone()]);
        let candidates = gen.generate_all(&request, request.step_slots);

        let (day, _status, _stats) = solver.solve(&request, &candidates, None);
        let day = day.expect("feasible single-worker problem");
        assert_eq!(day.assignments.len(), 1);
    }

    #[test]
    fn enforced_min_demand_is_satisfied_when_feasible() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let heuristic = HeuristicSolver::new(&sp, &lp, &bp);
        let mut config = SolverConfig::default();
        config.enforce_min_demand = true;
        let solver = CpSolver::new(config, &heuristic);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut workers = Vec::new();
        for i in 0..3 {
            let mut w = Worker::new(format!("w{i}"), format!("Worker {i}"));
            w.availability.insert(date, Availability::window(0, 40));
            workers.push(w);
        }
        let request = ScheduleRequest::new(date, workers);
        let candidates = gen.generate_all(&request, request.step_slots);

        let mut curve = DemandCurve::new(date, 15, request.total_slots());
        curve.set_demand_range(10, 20, crate::domain::DemandPoint::new(1, 1, 3, DemandPriority::High));

        let (day, status, _stats) = solver.solve(&request, &candidates, Some(&curve));
        if status == SolverStatus::Optimal {
            let day = day.unwrap();
            for slot in 10..20 {
                assert!(day.coverage_at(slot) >= 1);
            }
        }
    }

    #[test]
    fn worker_on_lunch_does_not_count_toward_coverage() {
        let sp = DefaultShiftPolicy::default();
        let lp = DefaultLunchPolicy::default();
        let bp = DefaultBreakPolicy::default();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let heuristic = HeuristicSolver::new(&sp, &lp, &bp);
        let solver = CpSolver::new(SolverConfig::default(), &heuristic);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        // 0..40 slots @ 15 min spans 10 hours, long enough to require a lunch.
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, Availability::window(0, 40));
        let request = ScheduleRequest::new(date, vec![worker]);
        let candidates = gen.generate_all(&request, request.step_slots);

        let (day, status, _stats) = solver.solve(&request, &candidates, None);
        if status == SolverStatus::Optimal {
            let day = day.unwrap();
            if let Some(assignment) = day.assignments.get("w1") {
                if let Some(lunch) = assignment.lunch_block {
                    for slot in lunch.start_slot..lunch.end_slot {
                        assert_eq!(day.coverage_at(slot), 0);
                    }
                }
            }
        }
    }
}
