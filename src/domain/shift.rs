use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::block::ScheduleBlock;
use super::roles::Role;

/// A role assigned to a contiguous on-floor interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobAssignment {
    pub role: Role,
    pub block: ScheduleBlock,
}

/// A single worker's shift on a single date, as produced by a solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub worker_id: String,
    pub schedule_date: NaiveDate,
    pub shift_start_slot: u32,
    pub shift_end_slot: u32,
    pub lunch_block: Option<ScheduleBlock>,
    pub break_blocks: Vec<ScheduleBlock>,
    pub job_assignments: Vec<JobAssignment>,
    pub slot_minutes: u32,
}

impl ShiftAssignment {
    pub fn total_shift_slots(&self) -> u32 {
        self.shift_end_slot - self.shift_start_slot
    }

    pub fn total_shift_minutes(&self) -> u32 {
        self.total_shift_slots() * self.slot_minutes
    }

    pub fn lunch_minutes(&self) -> u32 {
        self.lunch_block
            .map(|b| b.slot_count() * self.slot_minutes)
            .unwrap_or(0)
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_blocks
            .iter()
            .map(|b| b.slot_count() * self.slot_minutes)
            .sum()
    }

    /// Minutes excluding lunch, including breaks.
    pub fn work_minutes(&self) -> u32 {
        self.total_shift_minutes() - self.lunch_minutes()
    }

    pub fn is_on_floor(&self, slot: u32) -> bool {
        if slot < self.shift_start_slot || slot >= self.shift_end_slot {
            return false;
        }
        if self.lunch_block.map(|b| b.contains_slot(slot)).unwrap_or(false) {
            return false;
        }
        if self.break_blocks.iter().any(|b| b.contains_slot(slot)) {
            return false;
        }
        true
    }

    pub fn role_at_slot(&self, slot: u32) -> Option<Role> {
        self.job_assignments
            .iter()
            .find(|ja| ja.block.contains_slot(slot))
            .map(|ja| ja.role)
    }

    /// Maximal contiguous on-floor intervals within the shift (shift minus
    /// lunch minus breaks).
    pub fn on_floor_intervals(&self) -> Vec<ScheduleBlock> {
        let mut intervals = Vec::new();
        let mut current_start: Option<u32> = None;
        for slot in self.shift_start_slot..self.shift_end_slot {
            if self.is_on_floor(slot) {
                current_start.get_or_insert(slot);
            } else if let Some(start) = current_start.take() {
                intervals.push(ScheduleBlock::new(start, slot));
            }
        }
        if let Some(start) = current_start {
            intervals.push(ScheduleBlock::new(start, self.shift_end_slot));
        }
        intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(slot_minutes: u32) -> ShiftAssignment {
        ShiftAssignment {
            worker_id: "w1".into(),
            schedule_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            shift_start_slot: 12,
            shift_end_slot: 46,
            lunch_block: Some(ScheduleBlock::new(26, 30)),
            break_blocks: vec![ScheduleBlock::new(18, 19), ScheduleBlock::new(38, 39)],
            job_assignments: vec![],
            slot_minutes,
        }
    }

    #[test]
    fn work_minutes_excludes_lunch_includes_breaks() {
        let s = base(15);
        assert_eq!(s.total_shift_slots(), 34);
        assert_eq!(s.lunch_minutes(), 60);
        assert_eq!(s.work_minutes(), 34 * 15 - 60);
    }

    #[test]
    fn on_floor_intervals_exclude_lunch_and_breaks() {
        let s = base(15);
        let intervals = s.on_floor_intervals();
        assert_eq!(
            intervals,
            vec![
                ScheduleBlock::new(12, 18),
                ScheduleBlock::new(19, 26),
                ScheduleBlock::new(30, 38),
                ScheduleBlock::new(39, 46),
            ]
        );
    }
}
