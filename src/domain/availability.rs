use serde::{Deserialize, Serialize};

/// A worker's availability window on a single date, in slot indices.
///
/// Either "off" (no slots available) or a half-open window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    off: bool,
    start_slot: u32,
    end_slot: u32,
}

impl Availability {
    pub fn window(start_slot: u32, end_slot: u32) -> Self {
        Self {
            off: false,
            start_slot,
            end_slot,
        }
    }

    pub fn off_day() -> Self {
        Self {
            off: true,
            start_slot: 0,
            end_slot: 0,
        }
    }

    pub fn is_off(&self) -> bool {
        self.off
    }

    pub fn start_slot(&self) -> u32 {
        self.start_slot
    }

    pub fn end_slot(&self) -> u32 {
        self.end_slot
    }

    pub fn slot_count(&self) -> u32 {
        if self.off {
            0
        } else {
            self.end_slot.saturating_sub(self.start_slot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_day_has_zero_slots() {
        let a = Availability::off_day();
        assert!(a.is_off());
        assert_eq!(a.slot_count(), 0);
    }

    #[test]
    fn window_slot_count() {
        let a = Availability::window(12, 44);
        assert!(!a.is_off());
        assert_eq!(a.slot_count(), 32);
    }
}
