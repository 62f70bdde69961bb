use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    BreakPolicy, DaySchedule, DaysOffPattern, LunchPolicy, Role, ScheduleRequest, ShiftPolicy,
    WeeklySchedule, WeeklyScheduleRequest, Worker,
};

/// Maximum consecutive calendar days a worker may be scheduled regardless
/// of the configured days-off pattern.
const MAX_CONSECUTIVE_WORK_DAYS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorType {
    ShiftOutsideDay,
    ShiftOutsideAvailability,
    WorkTimeTooShort,
    WorkTimeTooLong,
    InvalidLunchDuration,
    InvalidBreakCount,
    InvalidBreakDuration,
    RoleNotAllowedBySupervisor,
    RoleCannotDo,
    RoleCapExceeded,
    MaxDailyHoursExceeded,
    MaxWeeklyHoursExceeded,
    LunchOutsideShift,
    BreakOutsideShift,
    BreakOverlapsLunch,
    BreaksOverlap,
    NoJobAssignment,
    InsufficientDaysOff,
    DaysOffPatternViolated,
    MinWeeklyHoursNotMet,
    FairnessThresholdExceeded,
    ConsecutiveWorkDaysExceeded,
}

/// One finding: a kind tag, a message, and enough context (worker, slot,
/// detail map) to act on it without re-deriving it from the schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorType,
    pub message: String,
    pub worker_id: Option<String>,
    pub slot: Option<u32>,
    pub details: HashMap<String, String>,
}

impl ValidationError {
    fn new(kind: ValidationErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            worker_id: None,
            slot: None,
            details: HashMap::new(),
        }
    }

    fn with_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    fn with_slot(mut self, slot: u32) -> Self {
        self.slot = Some(slot);
        self
    }

    fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Independent pass producing typed errors and advisory warnings for a
/// produced schedule. Never mutates the schedule it inspects.
pub struct Validator<'a> {
    pub shift_policy: &'a dyn ShiftPolicy,
    pub lunch_policy: &'a dyn LunchPolicy,
    pub break_policy: &'a dyn BreakPolicy,
}

impl<'a> Validator<'a> {
    pub fn new(shift_policy: &'a dyn ShiftPolicy, lunch_policy: &'a dyn LunchPolicy, break_policy: &'a dyn BreakPolicy) -> Self {
        Self {
            shift_policy,
            lunch_policy,
            break_policy,
        }
    }

    pub fn validate_day(&self, day: &DaySchedule, request: &ScheduleRequest) -> ValidationResult {
        let mut result = ValidationResult::default();
        let workers_by_id: HashMap<&str, &Worker> = request.workers.iter().map(|w| (w.id.as_str(), w)).collect();

        for (worker_id, assignment) in &day.assignments {
            let Some(worker) = workers_by_id.get(worker_id.as_str()) else {
                continue;
            };
            result.errors.extend(self.validate_assignment(worker, assignment, request, day.total_slots));
        }

        for slot in 0..day.total_slots {
            for role in Role::all() {
                let cap = request.role_caps.cap_at(slot, role);
                let coverage = day.role_coverage_at(slot, role);
                if coverage > cap {
                    result.errors.push(
                        ValidationError::new(
                            ValidationErrorType::RoleCapExceeded,
                            format!("{role:?} coverage {coverage} exceeds cap {cap} at slot {slot}"),
                        )
                        .with_slot(slot)
                        .with_detail("role", format!("{role:?}"))
                        .with_detail("coverage", coverage.to_string())
                        .with_detail("cap", cap.to_string()),
                    );
                }
            }
        }

        result
    }

    fn validate_assignment(
        &self,
        worker: &Worker,
        assignment: &crate::domain::ShiftAssignment,
        request: &ScheduleRequest,
        total_slots: u32,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let worker_id = &worker.id;

        if assignment.shift_end_slot > total_slots {
            errors.push(
                ValidationError::new(ValidationErrorType::ShiftOutsideDay, "shift extends past the end of the day")
                    .with_worker(worker_id),
            );
        }

        let availability = worker.get_availability(request.schedule_date);
        if availability.is_off() {
            errors.push(
                ValidationError::new(ValidationErrorType::ShiftOutsideAvailability, "worker is marked off on this date")
                    .with_worker(worker_id),
            );
        } else if assignment.shift_start_slot < availability.start_slot() || assignment.shift_end_slot > availability.end_slot() {
            errors.push(
                ValidationError::new(
                    ValidationErrorType::ShiftOutsideAvailability,
                    "shift extends outside the worker's available window",
                )
                .with_worker(worker_id),
            );
        }

        let work_minutes = assignment.work_minutes();
        if work_minutes < self.shift_policy.min_work_minutes() {
            errors.push(
                ValidationError::new(ValidationErrorType::WorkTimeTooShort, format!("work_minutes {work_minutes} below policy minimum"))
                    .with_worker(worker_id),
            );
        }
        if work_minutes > self.shift_policy.max_work_minutes() {
            errors.push(
                ValidationError::new(ValidationErrorType::WorkTimeTooLong, format!("work_minutes {work_minutes} above policy maximum"))
                    .with_worker(worker_id),
            );
        }
        if work_minutes > worker.max_minutes_per_day {
            errors.push(
                ValidationError::new(
                    ValidationErrorType::MaxDailyHoursExceeded,
                    format!("work_minutes {work_minutes} exceeds worker's daily cap {}", worker.max_minutes_per_day),
                )
                .with_worker(worker_id),
            );
        }

        let expected_lunch_minutes = self.lunch_policy.lunch_minutes(work_minutes);
        let actual_lunch_minutes = assignment.lunch_minutes();
        if actual_lunch_minutes != expected_lunch_minutes {
            errors.push(
                ValidationError::new(
                    ValidationErrorType::InvalidLunchDuration,
                    format!("lunch_minutes {actual_lunch_minutes} does not match policy value {expected_lunch_minutes}"),
                )
                .with_worker(worker_id),
            );
        }
        if let Some(lunch) = assignment.lunch_block {
            if lunch.start_slot < assignment.shift_start_slot || lunch.end_slot > assignment.shift_end_slot {
                errors.push(
                    ValidationError::new(ValidationErrorType::LunchOutsideShift, "lunch block extends outside the shift")
                        .with_worker(worker_id),
                );
            }
        }

        let expected_break_count = self.break_policy.break_count(work_minutes);
        if assignment.break_blocks.len() as u32 != expected_break_count {
            errors.push(
                ValidationError::new(
                    ValidationErrorType::InvalidBreakCount,
                    format!("break count {} does not match policy value {expected_break_count}", assignment.break_blocks.len()),
                )
                .with_worker(worker_id),
            );
        }
        let expected_break_duration = self.break_policy.break_duration_slots(assignment.slot_minutes);
        for (i, block) in assignment.break_blocks.iter().enumerate() {
            if block.slot_count() != expected_break_duration {
                errors.push(
                    ValidationError::new(ValidationErrorType::InvalidBreakDuration, format!("break {i} duration does not match policy"))
                        .with_worker(worker_id),
                );
            }
            if block.start_slot < assignment.shift_start_slot || block.end_slot > assignment.shift_end_slot {
                errors.push(
                    ValidationError::new(ValidationErrorType::BreakOutsideShift, format!("break {i} extends outside the shift"))
                        .with_worker(worker_id),
                );
            }
            if let Some(lunch) = assignment.lunch_block {
                if lunch.overlaps(block) {
                    errors.push(
                        ValidationError::new(ValidationErrorType::BreakOverlapsLunch, format!("break {i} overlaps the lunch block"))
                            .with_worker(worker_id),
                    );
                }
            }
            for (j, other) in assignment.break_blocks.iter().enumerate() {
                if i != j && block.overlaps(other) {
                    errors.push(
                        ValidationError::new(ValidationErrorType::BreaksOverlap, format!("break {i} overlaps break {j}"))
                            .with_worker(worker_id),
                    );
                }
            }
        }

        for job in &assignment.job_assignments {
            if worker.forbidden_roles.contains(&job.role) {
                errors.push(
                    ValidationError::new(
                        ValidationErrorType::RoleNotAllowedBySupervisor,
                        format!("{:?} is forbidden for this worker", job.role),
                    )
                    .with_worker(worker_id)
                    .with_detail("role", format!("{:?}", job.role)),
                );
            } else if !worker.allowed_roles.contains(&job.role) {
                errors.push(
                    ValidationError::new(ValidationErrorType::RoleCannotDo, format!("{:?} is not in the worker's allowed roles", job.role))
                        .with_worker(worker_id)
                        .with_detail("role", format!("{:?}", job.role)),
                );
            }
        }

        for slot in assignment.shift_start_slot..assignment.shift_end_slot {
            if assignment.is_on_floor(slot) && assignment.role_at_slot(slot).is_none() {
                errors.push(
                    ValidationError::new(ValidationErrorType::NoJobAssignment, format!("on-floor slot {slot} has no role assignment"))
                        .with_worker(worker_id)
                        .with_slot(slot),
                );
            }
        }

        errors
    }

    pub fn validate_week(&self, week: &WeeklySchedule, request: &WeeklyScheduleRequest) -> ValidationResult {
        let mut result = ValidationResult::default();

        for day_request in request.dates().into_iter().map(|date| {
            let day_workers: Vec<Worker> = request
                .workers
                .iter()
                .filter(|w| week.days.get(&date).map(|d| d.assignments.contains_key(&w.id)).unwrap_or(false))
                .cloned()
                .collect();
            request.day_request_for(date, day_workers)
        }) {
            if let Some(day) = week.days.get(&day_request.schedule_date) {
                result.merge(self.validate_day(day, &day_request));
            }
        }

        let minutes_by_worker = week.weekly_minutes_by_worker();
        let days_worked = week.days_worked_by_worker();
        let worker_ids: Vec<String> = request.workers.iter().map(|w| w.id.clone()).collect();
        let days_off = week.days_off_by_worker(&worker_ids);

        let values: Vec<u32> = minutes_by_worker.values().copied().collect();
        let average = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<u32>() as f64 / values.len() as f64
        };
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);

        for worker in &request.workers {
            let minutes = *minutes_by_worker.get(&worker.id).unwrap_or(&0);
            if minutes > worker.max_minutes_per_week {
                result.errors.push(
                    ValidationError::new(
                        ValidationErrorType::MaxWeeklyHoursExceeded,
                        format!("weekly minutes {minutes} exceed cap {}", worker.max_minutes_per_week),
                    )
                    .with_worker(&worker.id),
                );
            }

            let off_dates = days_off.get(&worker.id).cloned().unwrap_or_default();
            if off_dates.len() < request.required_days_off as usize {
                result.errors.push(
                    ValidationError::new(
                        ValidationErrorType::InsufficientDaysOff,
                        format!("worker has {} day(s) off, needs {}", off_dates.len(), request.required_days_off),
                    )
                    .with_worker(&worker.id),
                );
            }

            let worked_dates = days_worked.get(&worker.id).cloned().unwrap_or_default();

            if let Some(violation) = pattern_violation(request.days_off_pattern, &off_dates, &worked_dates) {
                result.errors.push(
                    ValidationError::new(ValidationErrorType::DaysOffPatternViolated, violation).with_worker(&worker.id),
                );
            }

            if let Some(run) = longest_consecutive_run(&worked_dates) {
                if run > MAX_CONSECUTIVE_WORK_DAYS {
                    result.errors.push(
                        ValidationError::new(
                            ValidationErrorType::ConsecutiveWorkDaysExceeded,
                            format!("worker worked {run} consecutive days, max is {MAX_CONSECUTIVE_WORK_DAYS}"),
                        )
                        .with_worker(&worker.id),
                    );
                }
            }

            if request.fairness_config.min_weekly_minutes > 0 && minutes < request.fairness_config.min_weekly_minutes {
                result.warnings.push(
                    ValidationError::new(
                        ValidationErrorType::MinWeeklyHoursNotMet,
                        format!("weekly minutes {minutes} below minimum {}", request.fairness_config.min_weekly_minutes),
                    )
                    .with_worker(&worker.id),
                );
            }

            if average > 0.0 && (minutes as f64) < average * 0.5 {
                result.warnings.push(
                    ValidationError::new(
                        ValidationErrorType::FairnessThresholdExceeded,
                        format!("weekly minutes {minutes} are below 50% of the average {average:.0}"),
                    )
                    .with_worker(&worker.id),
                );
            }
        }

        if (max - min) as f64 > request.fairness_config.max_hours_variance {
            result.warnings.push(ValidationError::new(
                ValidationErrorType::FairnessThresholdExceeded,
                format!("hours variance {} exceeds max_hours_variance {}", max - min, request.fairness_config.max_hours_variance),
            ));
        }

        result
    }
}

fn pattern_violation(
    pattern: DaysOffPattern,
    off_dates: &[chrono::NaiveDate],
    worked_dates: &[chrono::NaiveDate],
) -> Option<String> {
    use chrono::Datelike;
    match pattern {
        DaysOffPattern::None | DaysOffPattern::Custom => None,
        DaysOffPattern::TwoConsecutive => {
            let mut sorted = off_dates.to_vec();
            sorted.sort();
            let has_pair = sorted.windows(2).any(|w| w[1] == w[0].succ_opt().unwrap_or(w[1]));
            if has_pair {
                None
            } else {
                Some("no pair of off-dates is consecutive".into())
            }
        }
        DaysOffPattern::OneWeekendDay => {
            let has_weekend = off_dates.iter().any(|d| d.weekday().num_days_from_monday() >= 5);
            if has_weekend {
                None
            } else {
                Some("no weekend day is off".into())
            }
        }
        DaysOffPattern::EveryOtherDay => {
            let mut sorted = worked_dates.to_vec();
            sorted.sort();
            let has_consecutive_work = sorted.windows(2).any(|w| w[1] == w[0].succ_opt().unwrap_or(w[1]));
            if has_consecutive_work {
                Some("two consecutive dates were worked".into())
            } else {
                None
            }
        }
    }
}

fn longest_consecutive_run(dates: &[chrono::NaiveDate]) -> Option<u32> {
    if dates.is_empty() {
        return None;
    }
    let mut sorted = dates.to_vec();
    sorted.sort();
    let mut longest = 1u32;
    let mut current = 1u32;
    for pair in sorted.windows(2) {
        if pair[1] == pair[0].succ_opt()? {
            current += 1;
        } else {
            current = 1;
        }
        longest = longest.max(current);
    }
    Some(longest)
}
