//! End-to-end scenarios driven only through the public entry points:
//! `solve_day`, `solve_day_cp`, `solve_week`.

use std::collections::HashSet;

use chrono::NaiveDate;

use shift_scheduler::domain::{
    Availability, CapTable, DaysOffPattern, DemandCurve, DemandPoint, DemandPriority, FairnessConfig, Role,
    ScheduleRequest, Worker, WeeklyScheduleRequest,
};
use shift_scheduler::scheduling::{solve_day, solve_day_cp, solve_week, SolverConfig, SolverStatus, SolverType};

fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

/// S1 - one worker, 08:00-16:00 availability, single-day request.
#[test]
fn s1_minimal_single_worker() {
    let date = default_date();
    let mut worker = Worker::new("w1", "Ann");
    worker.availability.insert(date, Availability::window(12, 44));
    let request = ScheduleRequest::new(date, vec![worker]);

    let (day, stats) = solve_day(&request).unwrap();
    assert_eq!(stats.workers_scheduled, 1);

    let assignment = day.assignments.get("w1").unwrap();
    assert_eq!(assignment.work_minutes(), 420);
    assert_eq!(assignment.lunch_minutes(), 60);
    assert_eq!(assignment.break_blocks.len(), 2);
    assert_eq!(assignment.total_shift_slots(), 32);

    for slot in assignment.shift_start_slot..assignment.shift_end_slot {
        if assignment.is_on_floor(slot) {
            assert_eq!(assignment.role_at_slot(slot), Some(Role::Picking));
        }
    }
}

/// S2 - five workers eligible for GMD_SM, capped at 2; the rest fall
/// back to PICKING.
#[test]
fn s2_cap_enforcement() {
    let date = default_date();
    let mut workers = Vec::new();
    for i in 0..5 {
        let mut w = Worker::new(format!("w{i}"), format!("Worker {i}"));
        w.availability.insert(date, Availability::window(12, 44));
        workers.push(w);
    }

    let mut request = ScheduleRequest::new(date, workers);
    request.role_caps.global.insert(Role::GmdSm, 2);
    request.role_caps.global.insert(Role::Picking, 999);

    let (day, _stats) = solve_day(&request).unwrap();
    for slot in 0..day.total_slots {
        assert!(day.role_coverage_at(slot, Role::GmdSm) <= 2);
    }
}

/// S3 - ten workers, same availability; lunch starts should be staggered.
#[test]
fn s3_lunch_staggering() {
    let date = default_date();
    let mut workers = Vec::new();
    for i in 0..10 {
        let mut w = Worker::new(format!("w{i}"), format!("Worker {i}"));
        w.availability.insert(date, Availability::window(0, 36));
        workers.push(w);
    }
    let request = ScheduleRequest::new(date, workers);

    let (day, _stats) = solve_day(&request).unwrap();
    let mut starts: Vec<u32> = day
        .assignments
        .values()
        .filter_map(|a| a.lunch_block.map(|b| b.start_slot))
        .collect();
    starts.sort();
    let mut duplicates = 0;
    for window in starts.windows(2) {
        if window[0] == window[1] {
            duplicates += 1;
        }
    }
    assert!(duplicates <= 1, "expected at most one duplicate lunch start, got {duplicates}");
}

/// S4 - weekly TWO_CONSECUTIVE pattern: worker works 5 of 7 days with 2
/// consecutive days off, and the validator finds no pattern violation.
#[test]
fn s4_weekly_two_consecutive_days_off() {
    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 11).unwrap();
    let mut worker = Worker::new("w1", "Ann");
    worker.max_minutes_per_week = 2400;
    let mut d = start;
    while d <= end {
        worker.availability.insert(d, Availability::window(0, 68));
        d = d.succ_opt().unwrap();
    }

    let request = WeeklyScheduleRequest {
        start_date: start,
        end_date: end,
        workers: vec![worker],
        day_start_minutes: 300,
        day_end_minutes: 1320,
        slot_minutes: 15,
        role_caps: CapTable::default(),
        busy_days: HashSet::new(),
        days_off_pattern: DaysOffPattern::TwoConsecutive,
        required_days_off: 2,
        fairness_config: FairnessConfig::default(),
        step_slots: 2,
    };

    let (week, _demand_metrics, solver_stats, _match_score) = solve_week(&request, None, SolverType::Heuristic).unwrap();
    assert_eq!(solver_stats.len(), 7);

    let worked_days = week.days.values().filter(|d| d.assignments.contains_key("w1")).count();
    assert!(worked_days <= 6);

    let off_dates = week.days_off_by_worker(&["w1".to_string()]);
    let off = &off_dates["w1"];
    let has_consecutive_pair = off.windows(2).any(|w| (w[1] - w[0]).num_days() == 1);
    assert!(off.len() >= 2);
    assert!(has_consecutive_pair, "expected two consecutive off-dates, got {off:?}");
}

/// S5 - CP with a demand curve: hard minimum of 1 across 09:00-15:00
/// when `enforce_min_demand` is set.
#[test]
fn s5_cp_with_demand_curve() {
    let date = default_date();
    let mut workers = Vec::new();
    for i in 0..5 {
        let mut w = Worker::new(format!("w{i}"), format!("Worker {i}"));
        w.availability.insert(date, Availability::window(0, 68));
        workers.push(w);
    }
    let request = ScheduleRequest::new(date, workers);

    let mut curve = DemandCurve::new(date, 15, request.total_slots());
    curve.set_demand_range(0, request.total_slots(), DemandPoint::new(0, 1, 5, DemandPriority::Normal));
    curve.set_demand_range(16, 40, DemandPoint::new(1, 3, 5, DemandPriority::High));

    let mut config = SolverConfig::default();
    config.enforce_min_demand = true;

    let (day, status, _stats) = solve_day_cp(&request, Some(curve), config).unwrap();

    if status == SolverStatus::Optimal || status == SolverStatus::Feasible {
        let day = day.unwrap();
        for slot in 16..40 {
            assert!(day.coverage_at(slot) >= 1, "slot {slot} undercovered");
        }
    }
}

/// S6 - opener availability forces an initial PICKING role that must
/// persist across breaks when no specialized role is available.
#[test]
fn s6_opener_picking_persists() {
    let date = default_date();
    let mut worker = Worker::new("w1", "Ann");
    worker.availability.insert(date, Availability::window(0, 34));
    let mut request = ScheduleRequest::new(date, vec![worker]);
    request.role_caps.global.insert(Role::GmdSm, 0);
    request.role_caps.global.insert(Role::ExceptionSm, 0);
    request.role_caps.global.insert(Role::Staging, 0);
    request.role_caps.global.insert(Role::Backroom, 0);
    request.role_caps.global.insert(Role::Sr, 0);

    let (day, _stats) = solve_day(&request).unwrap();
    let assignment = day.assignments.get("w1").unwrap();
    for job in &assignment.job_assignments {
        assert_eq!(job.role, Role::Picking);
    }
}
