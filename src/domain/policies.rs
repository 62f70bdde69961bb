use super::block::ScheduleBlock;

/// Minimum/maximum work-minute bounds for a shift. "Work minutes" excludes
/// lunch but includes breaks.
pub trait ShiftPolicy: Send + Sync {
    fn min_work_minutes(&self) -> u32;
    fn max_work_minutes(&self) -> u32;

    fn is_valid(&self, work_minutes: u32) -> bool {
        work_minutes >= self.min_work_minutes() && work_minutes <= self.max_work_minutes()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultShiftPolicy {
    pub min_work_minutes: u32,
    pub max_work_minutes: u32,
}

impl Default for DefaultShiftPolicy {
    fn default() -> Self {
        Self {
            min_work_minutes: 240,
            max_work_minutes: 480,
        }
    }
}

impl ShiftPolicy for DefaultShiftPolicy {
    fn min_work_minutes(&self) -> u32 {
        self.min_work_minutes
    }

    fn max_work_minutes(&self) -> u32 {
        self.max_work_minutes
    }
}

/// Required lunch duration as a function of work minutes, and the feasible
/// window of lunch start slots within a shift.
pub trait LunchPolicy: Send + Sync {
    fn lunch_minutes(&self, work_minutes: u32) -> u32;

    /// Returns the inclusive `[earliest_start, latest_start]` slot range a
    /// lunch of `lunch_slots` length may begin within `[shift_start,
    /// shift_end)`.
    fn lunch_window(
        &self,
        shift_start: u32,
        shift_end: u32,
        lunch_slots: u32,
        busy_day: bool,
        slot_minutes: u32,
    ) -> (u32, u32);
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultLunchPolicy {
    pub no_lunch_threshold: u32,
    pub short_lunch_threshold: u32,
    pub short_lunch_minutes: u32,
    pub long_lunch_minutes: u32,
    pub normal_day_window_minutes: u32,
    pub busy_day_window_minutes: u32,
}

impl Default for DefaultLunchPolicy {
    fn default() -> Self {
        Self {
            no_lunch_threshold: 360,
            short_lunch_threshold: 390,
            short_lunch_minutes: 30,
            long_lunch_minutes: 60,
            normal_day_window_minutes: 30,
            busy_day_window_minutes: 60,
        }
    }
}

impl LunchPolicy for DefaultLunchPolicy {
    fn lunch_minutes(&self, work_minutes: u32) -> u32 {
        if work_minutes < self.no_lunch_threshold {
            0
        } else if work_minutes < self.short_lunch_threshold {
            self.short_lunch_minutes
        } else {
            self.long_lunch_minutes
        }
    }

    fn lunch_window(
        &self,
        shift_start: u32,
        shift_end: u32,
        lunch_slots: u32,
        busy_day: bool,
        slot_minutes: u32,
    ) -> (u32, u32) {
        let slots_per_hour = (60 / slot_minutes).max(1);
        let shift_mid = (shift_start + shift_end) / 2;
        let target = shift_mid.saturating_sub(lunch_slots / 2);
        let window_minutes = if busy_day {
            self.busy_day_window_minutes
        } else {
            self.normal_day_window_minutes
        };
        let window_slots = (window_minutes / slot_minutes).max(1);

        let not_before = shift_start + slots_per_hour;
        let not_after = shift_end.saturating_sub(lunch_slots + slots_per_hour);

        let earliest = target.saturating_sub(window_slots).max(not_before);
        let latest = (target + window_slots).min(not_after);

        if earliest > latest {
            (earliest, earliest)
        } else {
            (earliest, latest)
        }
    }
}

/// Number and ideal placement of short breaks, as a function of work
/// minutes and the shift's lunch placement.
pub trait BreakPolicy: Send + Sync {
    fn break_count(&self, work_minutes: u32) -> u32;
    fn break_duration_slots(&self, slot_minutes: u32) -> u32;
    fn max_break_variance_slots(&self) -> u32;

    /// Ideal midpoint slot(s) for `count` breaks within `[shift_start,
    /// shift_end)`, accounting for an optional lunch block.
    fn target_positions(
        &self,
        shift_start: u32,
        shift_end: u32,
        count: u32,
        lunch: Option<ScheduleBlock>,
    ) -> Vec<u32>;
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultBreakPolicy {
    pub one_break_threshold: u32,
    pub two_break_threshold: u32,
    pub break_duration_minutes: u32,
    pub max_break_variance_slots: u32,
}

impl Default for DefaultBreakPolicy {
    fn default() -> Self {
        Self {
            one_break_threshold: 300,
            two_break_threshold: 420,
            break_duration_minutes: 15,
            max_break_variance_slots: 2,
        }
    }
}

impl DefaultBreakPolicy {
    fn snap_away_from_lunch(&self, target: u32, lunch: ScheduleBlock, floor: u32, ceil: u32) -> u32 {
        if lunch.contains_slot(target) {
            if target - floor <= ceil - target {
                lunch.start_slot.saturating_sub(1).max(floor)
            } else {
                lunch.end_slot.min(ceil)
            }
        } else {
            target.clamp(floor, ceil)
        }
    }
}

impl BreakPolicy for DefaultBreakPolicy {
    fn break_count(&self, work_minutes: u32) -> u32 {
        if work_minutes < self.one_break_threshold {
            0
        } else if work_minutes < self.two_break_threshold {
            1
        } else {
            2
        }
    }

    fn break_duration_slots(&self, slot_minutes: u32) -> u32 {
        (self.break_duration_minutes / slot_minutes).max(1)
    }

    fn max_break_variance_slots(&self) -> u32 {
        self.max_break_variance_slots
    }

    fn target_positions(
        &self,
        shift_start: u32,
        shift_end: u32,
        count: u32,
        lunch: Option<ScheduleBlock>,
    ) -> Vec<u32> {
        if count == 0 {
            return vec![];
        }

        match lunch {
            None => {
                if count == 1 {
                    vec![(shift_start + shift_end) / 2]
                } else {
                    let span = shift_end - shift_start;
                    vec![
                        shift_start + span / 3,
                        shift_start + (2 * span) / 3,
                    ]
                }
            }
            Some(block) => {
                let first_seg = (shift_start, block.start_slot);
                let second_seg = (block.end_slot, shift_end);
                if count == 1 {
                    let first_len = first_seg.1.saturating_sub(first_seg.0);
                    let second_len = second_seg.1.saturating_sub(second_seg.0);
                    let target = if first_len >= second_len {
                        (first_seg.0 + first_seg.1) / 2
                    } else {
                        (second_seg.0 + second_seg.1) / 2
                    };
                    vec![self.snap_away_from_lunch(target, block, shift_start, shift_end)]
                } else {
                    let t1 = (first_seg.0 + first_seg.1) / 2;
                    let t2 = (second_seg.0 + second_seg.1) / 2;
                    vec![
                        self.snap_away_from_lunch(t1, block, shift_start, shift_end),
                        self.snap_away_from_lunch(t2, block, shift_start, shift_end),
                    ]
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_policy_defaults_match_spec() {
        let p = DefaultShiftPolicy::default();
        assert_eq!(p.min_work_minutes(), 240);
        assert_eq!(p.max_work_minutes(), 480);
        assert!(p.is_valid(420));
        assert!(!p.is_valid(500));
    }

    #[test]
    fn lunch_minutes_step_function() {
        let p = DefaultLunchPolicy::default();
        assert_eq!(p.lunch_minutes(300), 0);
        assert_eq!(p.lunch_minutes(360), 30);
        assert_eq!(p.lunch_minutes(389), 30);
        assert_eq!(p.lunch_minutes(390), 60);
        assert_eq!(p.lunch_minutes(480), 60);
    }

    #[test]
    fn break_count_step_function() {
        let p = DefaultBreakPolicy::default();
        assert_eq!(p.break_count(240), 0);
        assert_eq!(p.break_count(300), 1);
        assert_eq!(p.break_count(419), 1);
        assert_eq!(p.break_count(420), 2);
    }

    #[test]
    fn break_targets_no_lunch_two_breaks_are_thirds() {
        let p = DefaultBreakPolicy::default();
        let targets = p.target_positions(0, 33, 2, None);
        assert_eq!(targets, vec![11, 22]);
    }

    #[test]
    fn lunch_window_avoids_first_and_last_hour() {
        let p = DefaultLunchPolicy::default();
        // 8h30m shift, 34 slots, lunch 4 slots, slot_minutes=15 (4 slots/hour).
        let (earliest, latest) = p.lunch_window(0, 34, 4, false, 15);
        assert!(earliest >= 4);
        assert!(latest <= 34 - 4 - 4);
    }
}
