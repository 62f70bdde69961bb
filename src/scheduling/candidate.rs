use crate::domain::{BreakPolicy, LunchPolicy, ScheduleRequest, ShiftPolicy, Worker};

/// A feasible shift skeleton for one worker: start/end slots, the implied
/// work minutes, and how much lunch/break time it carries. Lunch
/// placement and role mapping are decided later by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCandidate {
    pub start_slot: u32,
    pub end_slot: u32,
    pub work_minutes: u32,
    pub lunch_slots: u32,
    pub break_count: u32,
    pub slot_minutes: u32,
}

impl ShiftCandidate {
    pub fn total_shift_slots(&self) -> u32 {
        self.end_slot - self.start_slot
    }

    pub fn total_shift_minutes(&self) -> u32 {
        self.total_shift_slots() * self.slot_minutes
    }

    pub fn covers(&self, slot: u32) -> bool {
        slot >= self.start_slot && slot < self.end_slot
    }
}

/// Enumerates feasible shift candidates for workers under the shift/lunch/
/// break policies, respecting availability and per-worker daily caps.
pub struct CandidateGenerator<'a> {
    pub shift_policy: &'a dyn ShiftPolicy,
    pub lunch_policy: &'a dyn LunchPolicy,
    pub break_policy: &'a dyn BreakPolicy,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(
        shift_policy: &'a dyn ShiftPolicy,
        lunch_policy: &'a dyn LunchPolicy,
        break_policy: &'a dyn BreakPolicy,
    ) -> Self {
        Self {
            shift_policy,
            lunch_policy,
            break_policy,
        }
    }

    pub fn generate_for_worker(
        &self,
        worker: &Worker,
        request: &ScheduleRequest,
        step_slots: u32,
    ) -> Vec<ShiftCandidate> {
        let availability = worker.get_availability(request.schedule_date);
        if availability.is_off() {
            return vec![];
        }

        let slot_minutes = request.slot_minutes;
        let min_work_slots = self.shift_policy.min_work_minutes() / slot_minutes;
        let max_work_slots = self.shift_policy.max_work_minutes() / slot_minutes;

        let day_slots = request.total_slots();
        let avail_start = availability.start_slot();
        let avail_end = availability.end_slot().min(day_slots);

        if avail_end.saturating_sub(avail_start) < min_work_slots {
            return vec![];
        }

        let mut candidates = Vec::new();
        let step = step_slots.max(1);

        let mut start = avail_start;
        while start < avail_end {
            let mut work_slots = min_work_slots;
            while work_slots <= max_work_slots {
                let work_minutes = work_slots * slot_minutes;
                if work_minutes > worker.max_minutes_per_day {
                    work_slots += step;
                    continue;
                }

                let lunch_minutes = self.lunch_policy.lunch_minutes(work_minutes);
                let lunch_slots = lunch_minutes / slot_minutes;
                let end_slot = start + work_slots + lunch_slots;

                if end_slot <= avail_end.min(day_slots) {
                    candidates.push(ShiftCandidate {
                        start_slot: start,
                        end_slot,
                        work_minutes,
                        lunch_slots,
                        break_count: self.break_policy.break_count(work_minutes),
                        slot_minutes,
                    });
                }

                work_slots += step;
            }
            start += step;
        }

        candidates
    }

    pub fn generate_all(
        &self,
        request: &ScheduleRequest,
        step_slots: u32,
    ) -> std::collections::HashMap<String, Vec<ShiftCandidate>> {
        let mut all = std::collections::HashMap::new();
        for worker in &request.workers {
            let candidates = self.generate_for_worker(worker, request, step_slots);
            if !candidates.is_empty() {
                all.insert(worker.id.clone(), candidates);
            }
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, DefaultBreakPolicy, DefaultLunchPolicy, DefaultShiftPolicy};
    use chrono::NaiveDate;

    fn generator() -> (DefaultShiftPolicy, DefaultLunchPolicy, DefaultBreakPolicy) {
        (
            DefaultShiftPolicy::default(),
            DefaultLunchPolicy::default(),
            DefaultBreakPolicy::default(),
        )
    }

    #[test]
    fn off_day_yields_no_candidates() {
        let (sp, lp, bp) = generator();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, Availability::off_day());
        let req = ScheduleRequest::new(date, vec![worker.clone()]);
        assert!(gen.generate_for_worker(&worker, &req, 2).is_empty());
    }

    #[test]
    fn exact_min_window_yields_one_length() {
        let (sp, lp, bp) = generator();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        // 240 min / 15 = 16 slots exactly, no lunch (work<360).
        worker.availability.insert(date, Availability::window(0, 16));
        let req = ScheduleRequest::new(date, vec![worker.clone()]);
        let candidates = gen.generate_for_worker(&worker, &req, 2);
        let lengths: std::collections::HashSet<u32> =
            candidates.iter().map(|c| c.total_shift_slots()).collect();
        assert_eq!(lengths, std::collections::HashSet::from([16]));
    }

    #[test]
    fn s1_minimal_worker_has_candidate_matching_8h30() {
        let (sp, lp, bp) = generator();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, Availability::window(12, 44));
        let req = ScheduleRequest::new(date, vec![worker.clone()]);
        let candidates = gen.generate_for_worker(&worker, &req, 2);
        assert!(candidates
            .iter()
            .any(|c| c.work_minutes == 420 && c.lunch_slots == 4 && c.total_shift_slots() == 34));
    }
}
