use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandPriority {
    Low,
    Normal,
    High,
    Critical,
}

impl DemandPriority {
    pub fn multiplier(self, multipliers: &HashMap<DemandPriority, f64>) -> f64 {
        multipliers.get(&self).copied().unwrap_or_else(|| match self {
            DemandPriority::Low => 1.0,
            DemandPriority::Normal => 2.0,
            DemandPriority::High => 5.0,
            DemandPriority::Critical => 10.0,
        })
    }
}

/// Per-slot staffing target. Invariant: `0 <= min <= target <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub min_staff: u32,
    pub target_staff: u32,
    pub max_staff: u32,
    pub priority: DemandPriority,
}

impl DemandPoint {
    pub fn new(min_staff: u32, target_staff: u32, max_staff: u32, priority: DemandPriority) -> Self {
        let target_staff = target_staff.max(min_staff);
        let max_staff = max_staff.max(target_staff);
        Self {
            min_staff,
            target_staff,
            max_staff,
            priority,
        }
    }

    /// Build a point from an hourly target using the standard
    /// `min = floor(0.6 * target)`, `max = floor(1.5 * target) + 1` fill.
    pub fn from_target(target_staff: u32, priority: DemandPriority) -> Self {
        let min_staff = (target_staff as f64 * 0.6).floor() as u32;
        let max_staff = (target_staff as f64 * 1.5).floor() as u32 + 1;
        Self::new(min_staff, target_staff, max_staff, priority)
    }
}

/// Per-slot staffing targets for a single date, with optional per-role
/// targets and priority bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandCurve {
    pub schedule_date: NaiveDate,
    pub total_demand: HashMap<u32, DemandPoint>,
    pub role_demand: HashMap<u32, HashMap<Role, DemandPoint>>,
    pub priority_periods: Vec<(u32, u32, DemandPriority)>,
    pub slot_minutes: u32,
    pub total_slots: u32,
}

impl DemandCurve {
    pub fn new(schedule_date: NaiveDate, slot_minutes: u32, total_slots: u32) -> Self {
        Self {
            schedule_date,
            total_demand: HashMap::new(),
            role_demand: HashMap::new(),
            priority_periods: vec![],
            slot_minutes,
            total_slots,
        }
    }

    pub fn set_demand(&mut self, slot: u32, point: DemandPoint) {
        self.total_demand.insert(slot, point);
    }

    pub fn set_demand_range(&mut self, start_slot: u32, end_slot: u32, point: DemandPoint) {
        for slot in start_slot..end_slot {
            self.total_demand.insert(slot, point);
        }
    }

    pub fn add_priority_period(&mut self, start_slot: u32, end_slot: u32, priority: DemandPriority) {
        self.priority_periods.push((start_slot, end_slot, priority));
    }

    pub fn demand_at(&self, slot: u32) -> DemandPoint {
        self.total_demand
            .get(&slot)
            .copied()
            .unwrap_or(DemandPoint {
                min_staff: 0,
                target_staff: 0,
                max_staff: UNBOUNDED_STAFF,
                priority: DemandPriority::Normal,
            })
    }

    pub fn priority_at(&self, slot: u32) -> DemandPriority {
        for (start, end, priority) in &self.priority_periods {
            if slot >= *start && slot < *end {
                return *priority;
            }
        }
        self.demand_at(slot).priority
    }

    pub fn min_staff_at(&self, slot: u32) -> u32 {
        self.demand_at(slot).min_staff
    }

    pub fn target_staff_at(&self, slot: u32) -> u32 {
        self.demand_at(slot).target_staff
    }

    pub fn max_staff_at(&self, slot: u32) -> u32 {
        self.demand_at(slot).max_staff
    }
}

const UNBOUNDED_STAFF: u32 = u32::MAX / 2;

/// A named, reusable hourly demand pattern, convertible to a concrete
/// `DemandCurve` for any date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandProfile {
    pub name: String,
    pub description: String,
    pub hourly_pattern: HashMap<u32, u32>,
    pub role_patterns: HashMap<Role, HashMap<u32, u32>>,
    pub priority_windows: Vec<(u32, u32, DemandPriority)>,
}

impl DemandProfile {
    pub fn to_demand_curve(
        &self,
        date: NaiveDate,
        day_start_minutes: u32,
        slot_minutes: u32,
        total_slots: u32,
    ) -> DemandCurve {
        let mut curve = DemandCurve::new(date, slot_minutes, total_slots);
        for slot in 0..total_slots {
            let minute_of_day = day_start_minutes + slot * slot_minutes;
            let hour = minute_of_day / 60;
            if let Some(target) = self.hourly_pattern.get(&hour) {
                curve.set_demand(slot, DemandPoint::from_target(*target, DemandPriority::Normal));
            }
            for (role, pattern) in &self.role_patterns {
                if let Some(target) = pattern.get(&hour) {
                    curve
                        .role_demand
                        .entry(slot)
                        .or_default()
                        .insert(*role, DemandPoint::from_target(*target, DemandPriority::Normal));
                }
            }
        }
        for (start_hour, end_hour, priority) in &self.priority_windows {
            let start_slot = hour_to_slot(*start_hour, day_start_minutes, slot_minutes);
            let end_slot = hour_to_slot(*end_hour, day_start_minutes, slot_minutes);
            curve.add_priority_period(start_slot, end_slot, *priority);
        }
        curve
    }

    /// Moderate morning ramp, midday peak, tapering evening.
    pub fn weekday() -> Self {
        let mut hourly_pattern = HashMap::new();
        for (hour, target) in [
            (5, 2), (6, 3), (7, 4), (8, 6), (9, 8), (10, 10), (11, 10),
            (12, 9), (13, 9), (14, 8), (15, 7), (16, 6), (17, 5), (18, 4),
            (19, 3), (20, 2), (21, 2),
        ] {
            hourly_pattern.insert(hour, target);
        }
        Self {
            name: "weekday".into(),
            description: "Standard weekday demand curve".into(),
            hourly_pattern,
            role_patterns: HashMap::new(),
            priority_windows: vec![(10, 14, DemandPriority::High)],
        }
    }

    /// Flatter, slightly lower overall target than weekday.
    pub fn weekend() -> Self {
        let mut hourly_pattern = HashMap::new();
        for (hour, target) in [
            (5, 1), (6, 2), (7, 3), (8, 4), (9, 5), (10, 6), (11, 7),
            (12, 7), (13, 7), (14, 6), (15, 6), (16, 5), (17, 4), (18, 4),
            (19, 3), (20, 2), (21, 1),
        ] {
            hourly_pattern.insert(hour, target);
        }
        Self {
            name: "weekend".into(),
            description: "Standard weekend demand curve".into(),
            hourly_pattern,
            role_patterns: HashMap::new(),
            priority_windows: vec![(11, 15, DemandPriority::Normal)],
        }
    }

    /// Elevated targets across the whole day plus a CRITICAL midday window.
    pub fn high_volume() -> Self {
        let mut hourly_pattern = HashMap::new();
        for (hour, target) in [
            (5, 4), (6, 6), (7, 8), (8, 10), (9, 13), (10, 16), (11, 18),
            (12, 18), (13, 17), (14, 16), (15, 14), (16, 12), (17, 10),
            (18, 8), (19, 6), (20, 5), (21, 4),
        ] {
            hourly_pattern.insert(hour, target);
        }
        Self {
            name: "high_volume".into(),
            description: "Elevated demand for peak/event days".into(),
            hourly_pattern,
            role_patterns: HashMap::new(),
            priority_windows: vec![(10, 15, DemandPriority::Critical)],
        }
    }
}

fn hour_to_slot(hour: u32, day_start_minutes: u32, slot_minutes: u32) -> u32 {
    (hour * 60).saturating_sub(day_start_minutes) / slot_minutes
}

/// Binds calendar dates to demand curves, falling back to a weekday or
/// weekend default profile when a date has no explicit curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyDemand {
    pub demand_curves: HashMap<NaiveDate, DemandCurve>,
    pub weekday_profile: Option<DemandProfile>,
    pub weekend_profile: Option<DemandProfile>,
}

impl WeeklyDemand {
    pub fn standard_week(start_date: NaiveDate, day_start_minutes: u32, slot_minutes: u32, total_slots: u32) -> Self {
        use chrono::Datelike;
        let weekday = DemandProfile::weekday();
        let weekend = DemandProfile::weekend();
        let mut demand_curves = HashMap::new();
        for offset in 0..7 {
            let date = start_date + chrono::Duration::days(offset);
            let profile = match date.weekday() {
                chrono::Weekday::Sat | chrono::Weekday::Sun => &weekend,
                _ => &weekday,
            };
            demand_curves.insert(
                date,
                profile.to_demand_curve(date, day_start_minutes, slot_minutes, total_slots),
            );
        }
        Self {
            demand_curves,
            weekday_profile: Some(weekday),
            weekend_profile: Some(weekend),
        }
    }

    pub fn demand_for_date(
        &self,
        date: NaiveDate,
        day_start_minutes: u32,
        slot_minutes: u32,
        total_slots: u32,
    ) -> Option<DemandCurve> {
        if let Some(curve) = self.demand_curves.get(&date) {
            return Some(curve.clone());
        }
        use chrono::Datelike;
        let profile = match date.weekday() {
            chrono::Weekday::Sat | chrono::Weekday::Sun => self.weekend_profile.as_ref(),
            _ => self.weekday_profile.as_ref(),
        };
        profile.map(|p| p.to_demand_curve(date, day_start_minutes, slot_minutes, total_slots))
    }
}

/// Summary of how well a produced coverage timeline matched a demand
/// curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandMetrics {
    pub total_demand_minutes: u64,
    pub total_coverage_minutes: u64,
    pub undercoverage_minutes: u64,
    pub overcoverage_minutes: u64,
    pub match_score: f64,
    pub priority_match_scores: HashMap<DemandPriority, f64>,
}

impl DemandMetrics {
    pub fn calculate(curve: &DemandCurve, coverage_timeline: &[u32], slot_minutes: u32) -> Self {
        let mut total_demand = 0u64;
        let mut total_coverage = 0u64;
        let mut undercoverage = 0u64;
        let mut overcoverage = 0u64;
        let mut matched = 0u64;

        let mut priority_matched: HashMap<DemandPriority, (u64, u64)> = HashMap::new();

        for (slot, &coverage) in coverage_timeline.iter().enumerate() {
            let slot = slot as u32;
            let point = curve.demand_at(slot);
            let priority = curve.priority_at(slot);

            total_demand += point.target_staff as u64 * slot_minutes as u64;
            total_coverage += coverage.min(point.max_staff) as u64 * slot_minutes as u64;
            undercoverage += point.min_staff.saturating_sub(coverage) as u64 * slot_minutes as u64;
            overcoverage += coverage.saturating_sub(point.max_staff) as u64 * slot_minutes as u64;
            matched += coverage.min(point.target_staff) as u64;

            let entry = priority_matched.entry(priority).or_insert((0, 0));
            entry.0 += coverage.min(point.target_staff) as u64;
            entry.1 += point.target_staff as u64;
        }

        let match_score = if total_demand == 0 {
            100.0
        } else {
            100.0 * (matched as f64 * slot_minutes as f64) / total_demand as f64
        };

        let priority_match_scores = priority_matched
            .into_iter()
            .map(|(priority, (matched, target))| {
                let score = if target == 0 {
                    100.0
                } else {
                    100.0 * matched as f64 / target as f64
                };
                (priority, score)
            })
            .collect();

        Self {
            total_demand_minutes: total_demand,
            total_coverage_minutes: total_coverage,
            undercoverage_minutes: undercoverage,
            overcoverage_minutes: overcoverage,
            match_score,
            priority_match_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_point_from_target_fills_min_and_max() {
        let p = DemandPoint::from_target(10, DemandPriority::Normal);
        assert_eq!(p.min_staff, 6);
        assert_eq!(p.max_staff, 16);
    }

    #[test]
    fn match_score_is_100_when_target_is_zero() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let curve = DemandCurve::new(date, 15, 4);
        let metrics = DemandMetrics::calculate(&curve, &[0, 0, 0, 0], 15);
        assert_eq!(metrics.match_score, 100.0);
    }

    #[test]
    fn match_score_reflects_undercoverage() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut curve = DemandCurve::new(date, 15, 2);
        curve.set_demand(0, DemandPoint::new(1, 3, 5, DemandPriority::Normal));
        curve.set_demand(1, DemandPoint::new(1, 3, 5, DemandPriority::Normal));
        let metrics = DemandMetrics::calculate(&curve, &[3, 1], 15);
        // slot0 perfectly matched (3), slot1 under by 2 but matched=1
        assert!(metrics.match_score < 100.0);
        assert!(metrics.undercoverage_minutes > 0);
    }
}
