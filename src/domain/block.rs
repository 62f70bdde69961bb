use serde::{Deserialize, Serialize};

/// A half-open slot interval `[start_slot, end_slot)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub start_slot: u32,
    pub end_slot: u32,
}

impl ScheduleBlock {
    pub fn new(start_slot: u32, end_slot: u32) -> Self {
        debug_assert!(end_slot > start_slot, "block end must be after start");
        Self {
            start_slot,
            end_slot,
        }
    }

    pub fn slot_count(&self) -> u32 {
        self.end_slot - self.start_slot
    }

    pub fn contains_slot(&self, slot: u32) -> bool {
        slot >= self.start_slot && slot < self.end_slot
    }

    pub fn overlaps(&self, other: &ScheduleBlock) -> bool {
        self.start_slot < other.end_slot && other.start_slot < self.end_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_detection() {
        let a = ScheduleBlock::new(0, 4);
        let b = ScheduleBlock::new(3, 6);
        let c = ScheduleBlock::new(4, 6);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn contains_slot_is_half_open() {
        let a = ScheduleBlock::new(2, 5);
        assert!(!a.contains_slot(1));
        assert!(a.contains_slot(2));
        assert!(a.contains_slot(4));
        assert!(!a.contains_slot(5));
    }
}
