use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::day_schedule::DaySchedule;

/// Per-worker dispersion of weekly hours and days worked, computed after a
/// week has been fully scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairnessMetrics {
    pub avg_weekly_minutes: f64,
    pub min_weekly_minutes: u32,
    pub max_weekly_minutes: u32,
    pub hours_variance_minutes: f64,
    pub minutes_by_worker: HashMap<String, u32>,
    pub days_worked_by_worker: HashMap<String, u32>,
}

/// A schedule spanning an inclusive date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: HashMap<NaiveDate, DaySchedule>,
    pub fairness_metrics: Option<FairnessMetrics>,
}

impl WeeklySchedule {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            days: HashMap::new(),
            fairness_metrics: None,
        }
    }

    pub fn weekly_minutes_by_worker(&self) -> HashMap<String, u32> {
        let mut totals: HashMap<String, u32> = HashMap::new();
        for day in self.days.values() {
            for (worker_id, assignment) in &day.assignments {
                *totals.entry(worker_id.clone()).or_insert(0) += assignment.work_minutes();
            }
        }
        totals
    }

    pub fn days_worked_by_worker(&self) -> HashMap<String, Vec<NaiveDate>> {
        let mut result: HashMap<String, Vec<NaiveDate>> = HashMap::new();
        for (date, day) in &self.days {
            for worker_id in day.assignments.keys() {
                result.entry(worker_id.clone()).or_default().push(*date);
            }
        }
        for dates in result.values_mut() {
            dates.sort();
        }
        result
    }

    /// Dates on which a worker had no shift, within every date the
    /// coordinator actually produced a `DaySchedule` for.
    pub fn days_off_by_worker(&self, worker_ids: &[String]) -> HashMap<String, Vec<NaiveDate>> {
        let worked = self.days_worked_by_worker();
        let mut all_dates: Vec<NaiveDate> = self.days.keys().copied().collect();
        all_dates.sort();

        let mut result = HashMap::new();
        for worker_id in worker_ids {
            let worked_dates = worked.get(worker_id).cloned().unwrap_or_default();
            let off: Vec<NaiveDate> = all_dates
                .iter()
                .copied()
                .filter(|d| !worked_dates.contains(d))
                .collect();
            result.insert(worker_id.clone(), off);
        }
        result
    }

    pub fn coverage_timeline(&self, date: NaiveDate) -> Option<Vec<u32>> {
        self.days.get(&date).map(|d| d.coverage_timeline())
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}
