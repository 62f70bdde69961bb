use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::roles::{Role, UNBOUNDED_CAP};
use super::worker::Worker;

/// Per-slot, per-role concurrency caps, with an optional global default
/// and optional slot-specific overrides. The most specific entry wins;
/// an unset role falls back to `UNBOUNDED_CAP`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapTable {
    pub global: HashMap<Role, u32>,
    pub time_based: HashMap<u32, HashMap<Role, u32>>,
}

impl CapTable {
    pub fn cap_at(&self, slot: u32, role: Role) -> u32 {
        if let Some(overrides) = self.time_based.get(&slot) {
            if let Some(cap) = overrides.get(&role) {
                return *cap;
            }
        }
        *self.global.get(&role).unwrap_or(&UNBOUNDED_CAP)
    }
}

/// A capacity target for a named time block (e.g. "morning", "closing"),
/// used by phase 1 of the heuristic solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftBlockConfig {
    pub name: String,
    pub start_slot: u32,
    pub end_slot: u32,
    pub max_associates: u32,
    pub target_associates: u32,
}

impl ShiftBlockConfig {
    pub fn contains_slot(&self, slot: u32) -> bool {
        slot >= self.start_slot && slot < self.end_slot
    }
}

/// A capacity target for a specific shift-start slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftStartConfig {
    pub start_slot: u32,
    pub max_count: u32,
    pub target_count: u32,
}

/// A single day's scheduling request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub schedule_date: NaiveDate,
    pub workers: Vec<Worker>,
    pub day_start_minutes: u32,
    pub day_end_minutes: u32,
    pub slot_minutes: u32,
    pub role_caps: CapTable,
    pub is_busy_day: bool,
    pub shift_block_configs: Vec<ShiftBlockConfig>,
    pub shift_start_configs: Vec<ShiftStartConfig>,
    pub step_slots: u32,
}

impl ScheduleRequest {
    pub fn new(schedule_date: NaiveDate, workers: Vec<Worker>) -> Self {
        Self {
            schedule_date,
            workers,
            day_start_minutes: 300,
            day_end_minutes: 1320,
            slot_minutes: 15,
            role_caps: CapTable::default(),
            is_busy_day: false,
            shift_block_configs: vec![],
            shift_start_configs: vec![],
            step_slots: 2,
        }
    }

    pub fn total_slots(&self) -> u32 {
        (self.day_end_minutes - self.day_start_minutes) / self.slot_minutes
    }

    pub fn slot_to_minutes(&self, slot: u32) -> u32 {
        self.day_start_minutes + slot * self.slot_minutes
    }
}

/// How a week's required rest days must be distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DaysOffPattern {
    None,
    TwoConsecutive,
    OneWeekendDay,
    EveryOtherDay,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairnessConfig {
    pub target_weekly_minutes: Option<u32>,
    pub min_weekly_minutes: u32,
    pub max_hours_variance: f64,
    pub weight_hours_balance: f64,
    pub weight_days_balance: f64,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            target_weekly_minutes: None,
            min_weekly_minutes: 0,
            max_hours_variance: 120.0,
            weight_hours_balance: 0.7,
            weight_days_balance: 0.3,
        }
    }
}

/// A multi-day (weekly) scheduling request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScheduleRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub workers: Vec<Worker>,
    pub day_start_minutes: u32,
    pub day_end_minutes: u32,
    pub slot_minutes: u32,
    pub role_caps: CapTable,
    pub busy_days: HashSet<NaiveDate>,
    pub days_off_pattern: DaysOffPattern,
    pub required_days_off: u32,
    pub fairness_config: FairnessConfig,
    pub step_slots: u32,
}

impl WeeklyScheduleRequest {
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut d = self.start_date;
        while d <= self.end_date {
            dates.push(d);
            d = d.succ_opt().expect("date overflow");
        }
        dates
    }

    pub fn day_request_for(&self, date: NaiveDate, workers: Vec<Worker>) -> ScheduleRequest {
        ScheduleRequest {
            schedule_date: date,
            workers,
            day_start_minutes: self.day_start_minutes,
            day_end_minutes: self.day_end_minutes,
            slot_minutes: self.slot_minutes,
            role_caps: self.role_caps.clone(),
            is_busy_day: self.busy_days.contains(&date),
            shift_block_configs: vec![],
            shift_start_configs: vec![],
            step_slots: self.step_slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_table_falls_back_to_global_then_unbounded() {
        let mut caps = CapTable::default();
        caps.global.insert(Role::GmdSm, 2);
        assert_eq!(caps.cap_at(5, Role::GmdSm), 2);
        assert_eq!(caps.cap_at(5, Role::Picking), UNBOUNDED_CAP);

        let mut overrides = HashMap::new();
        overrides.insert(Role::GmdSm, 1);
        caps.time_based.insert(5, overrides);
        assert_eq!(caps.cap_at(5, Role::GmdSm), 1);
        assert_eq!(caps.cap_at(6, Role::GmdSm), 2);
    }

    #[test]
    fn total_slots_default_is_68() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let req = ScheduleRequest::new(date, vec![]);
        assert_eq!(req.total_slots(), 68);
    }

    #[test]
    fn weekly_dates_are_inclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 11).unwrap();
        let req = WeeklyScheduleRequest {
            start_date: start,
            end_date: end,
            workers: vec![],
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
        assert_eq!(req.dates().len(), 7);
    }
}
