use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::roles::Role;
use super::shift::ShiftAssignment;

/// All workers' shifts for a single date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub schedule_date: NaiveDate,
    pub assignments: HashMap<String, ShiftAssignment>,
    pub slot_minutes: u32,
    pub total_slots: u32,
}

impl DaySchedule {
    pub fn new(schedule_date: NaiveDate, slot_minutes: u32, total_slots: u32) -> Self {
        Self {
            schedule_date,
            assignments: HashMap::new(),
            slot_minutes,
            total_slots,
        }
    }

    pub fn coverage_at(&self, slot: u32) -> u32 {
        self.assignments
            .values()
            .filter(|a| a.is_on_floor(slot))
            .count() as u32
    }

    pub fn role_coverage_at(&self, slot: u32, role: Role) -> u32 {
        self.assignments
            .values()
            .filter(|a| a.is_on_floor(slot) && a.role_at_slot(slot) == Some(role))
            .count() as u32
    }

    pub fn on_lunch_at(&self, slot: u32) -> u32 {
        self.assignments
            .values()
            .filter(|a| a.lunch_block.map(|b| b.contains_slot(slot)).unwrap_or(false))
            .count() as u32
    }

    pub fn on_break_at(&self, slot: u32) -> u32 {
        self.assignments
            .values()
            .filter(|a| a.break_blocks.iter().any(|b| b.contains_slot(slot)))
            .count() as u32
    }

    pub fn coverage_timeline(&self) -> Vec<u32> {
        (0..self.total_slots).map(|s| self.coverage_at(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::ScheduleBlock;
    use crate::domain::shift::JobAssignment;

    #[test]
    fn coverage_counts_on_floor_workers_only() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut day = DaySchedule::new(date, 15, 68);
        let shift = ShiftAssignment {
            worker_id: "w1".into(),
            schedule_date: date,
            shift_start_slot: 12,
            shift_end_slot: 46,
            lunch_block: Some(ScheduleBlock::new(26, 30)),
            break_blocks: vec![],
            job_assignments: vec![JobAssignment {
                role: Role::Picking,
                block: ScheduleBlock::new(12, 26),
            }],
            slot_minutes: 15,
        };
        day.assignments.insert("w1".into(), shift);

        assert_eq!(day.coverage_at(20), 1);
        assert_eq!(day.coverage_at(27), 0);
        assert_eq!(day.role_coverage_at(20, Role::Picking), 1);
        assert_eq!(day.on_lunch_at(27), 1);
    }
}
