use std::collections::HashMap;

use tracing::debug;

use crate::domain::{
    BreakPolicy, CapTable, DaySchedule, JobAssignment, LunchPolicy, Role, ScheduleBlock,
    ScheduleRequest, ShiftAssignment, ShiftPolicy, Worker,
};

use super::candidate::ShiftCandidate;

/// Per-slot running counts the heuristic mutates as it places shifts,
/// lunches, breaks, and roles. Owned exclusively by one `solve` call and
/// discarded afterward.
struct SlotState {
    on_floor_count: Vec<u32>,
    on_lunch_count: Vec<u32>,
    on_break_count: Vec<u32>,
    lunch_start_count: Vec<u32>,
    role_counts: HashMap<Role, Vec<u32>>,
}

impl SlotState {
    fn new(total_slots: u32) -> Self {
        let n = total_slots as usize;
        let mut role_counts = HashMap::new();
        for role in Role::all() {
            role_counts.insert(role, vec![0u32; n]);
        }
        Self {
            on_floor_count: vec![0; n],
            on_lunch_count: vec![0; n],
            on_break_count: vec![0; n],
            lunch_start_count: vec![0; n],
            role_counts,
        }
    }

    fn role_count_at(&self, role: Role, slot: u32) -> u32 {
        self.role_counts[&role][slot as usize]
    }

    fn bump_role(&mut self, role: Role, slots: std::ops::Range<u32>, delta: i32) {
        let counts = self.role_counts.get_mut(&role).expect("role tracked");
        for slot in slots {
            apply_delta(&mut counts[slot as usize], delta);
        }
    }
}

fn apply_delta(value: &mut u32, delta: i32) {
    if delta >= 0 {
        *value += delta as u32;
    } else {
        *value = value.saturating_sub((-delta) as u32);
    }
}

/// Running counts against named shift blocks (e.g. "morning", "closing"),
/// only populated when the request carries `shift_block_configs`.
#[derive(Default)]
struct ShiftBlockState {
    counts: HashMap<String, u32>,
}

/// Running counts against specific shift-start slots, only populated when
/// the request carries `shift_start_configs`.
#[derive(Default)]
struct ShiftStartState {
    counts: HashMap<u32, u32>,
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicStats {
    pub workers_considered: usize,
    pub workers_scheduled: usize,
    pub wall_time_ms: f64,
}

/// Greedy, four-phase single-day solver: shift selection, lunch placement,
/// break placement, role assignment.
pub struct HeuristicSolver<'a> {
    pub shift_policy: &'a dyn ShiftPolicy,
    pub lunch_policy: &'a dyn LunchPolicy,
    pub break_policy: &'a dyn BreakPolicy,
}

struct Selected {
    worker_id: String,
    candidate: ShiftCandidate,
}

impl<'a> HeuristicSolver<'a> {
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

    pub fn solve(
        &self,
        request: &ScheduleRequest,
        candidates_by_worker: &HashMap<String, Vec<ShiftCandidate>>,
    ) -> (DaySchedule, HeuristicStats) {
        let start_instant = std::time::Instant::now();
        let total_slots = request.total_slots();
        let mut slot_state = SlotState::new(total_slots);
        let mut block_state = ShiftBlockState::default();
        let mut start_state = ShiftStartState::default();

        let selected = self.select_shifts(
            request,
            candidates_by_worker,
            &mut slot_state,
            &mut block_state,
            &mut start_state,
        );

        let mut day = DaySchedule::new(request.schedule_date, request.slot_minutes, total_slots);
        let workers_by_id: HashMap<&str, &Worker> =
            request.workers.iter().map(|w| (w.id.as_str(), w)).collect();

        for sel in &selected {
            let lunch_block = if sel.candidate.lunch_slots > 0 {
                Some(self.place_lunch(request, sel, &mut slot_state))
            } else {
                None
            };

            let break_blocks = self.place_breaks(request, sel, lunch_block, &mut slot_state);

            let worker = workers_by_id
                .get(sel.worker_id.as_str())
                .expect("selected worker exists in request");

            let job_assignments = self.assign_roles(
                request,
                worker,
                sel.candidate,
                lunch_block,
                &break_blocks,
                &mut slot_state,
            );

            let assignment = ShiftAssignment {
                worker_id: sel.worker_id.clone(),
                schedule_date: request.schedule_date,
                shift_start_slot: sel.candidate.start_slot,
                shift_end_slot: sel.candidate.end_slot,
                lunch_block,
                break_blocks,
                job_assignments,
                slot_minutes: request.slot_minutes,
            };
            day.assignments.insert(sel.worker_id.clone(), assignment);
        }

        let stats = HeuristicStats {
            workers_considered: candidates_by_worker.len(),
            workers_scheduled: day.assignments.len(),
            wall_time_ms: start_instant.elapsed().as_secs_f64() * 1000.0,
        };

        (day, stats)
    }

    /// Finishes a day schedule from shift selections whose lunch has
    /// already been decided upstream (the CP solver reads `ℓ[w,c,s]`
    /// straight out of its solution). Runs phases 3-4 only: break
    /// placement and role assignment, in ascending `shift_start_slot`
    /// order as phase 1 would leave them.
    pub fn solve_from_lunch_plan(
        &self,
        request: &ScheduleRequest,
        selections: Vec<(String, ShiftCandidate, Option<ScheduleBlock>)>,
    ) -> (DaySchedule, HeuristicStats) {
        let start_instant = std::time::Instant::now();
        let total_slots = request.total_slots();
        let mut slot_state = SlotState::new(total_slots);
        let workers_by_id: HashMap<&str, &Worker> =
            request.workers.iter().map(|w| (w.id.as_str(), w)).collect();

        let mut ordered = selections;
        ordered.sort_by_key(|(_, candidate, _)| candidate.start_slot);

        for (_, candidate, _) in &ordered {
            for slot in candidate.start_slot..candidate.end_slot {
                slot_state.on_floor_count[slot as usize] += 1;
            }
        }

        let mut day = DaySchedule::new(request.schedule_date, request.slot_minutes, total_slots);

        for (worker_id, candidate, lunch_block) in &ordered {
            if let Some(block) = lunch_block {
                for slot in block.start_slot..block.end_slot {
                    slot_state.on_lunch_count[slot as usize] += 1;
                    slot_state.on_floor_count[slot as usize] =
                        slot_state.on_floor_count[slot as usize].saturating_sub(1);
                }
                slot_state.lunch_start_count[block.start_slot as usize] += 1;
            }

            let sel = Selected { worker_id: worker_id.clone(), candidate: *candidate };
            let break_blocks = self.place_breaks(request, &sel, *lunch_block, &mut slot_state);

            let worker = workers_by_id
                .get(worker_id.as_str())
                .expect("selected worker exists in request");
            let job_assignments =
                self.assign_roles(request, worker, *candidate, *lunch_block, &break_blocks, &mut slot_state);

            let assignment = ShiftAssignment {
                worker_id: worker_id.clone(),
                schedule_date: request.schedule_date,
                shift_start_slot: candidate.start_slot,
                shift_end_slot: candidate.end_slot,
                lunch_block: *lunch_block,
                break_blocks,
                job_assignments,
                slot_minutes: request.slot_minutes,
            };
            day.assignments.insert(worker_id.clone(), assignment);
        }

        let stats = HeuristicStats {
            workers_considered: ordered.len(),
            workers_scheduled: day.assignments.len(),
            wall_time_ms: start_instant.elapsed().as_secs_f64() * 1000.0,
        };

        (day, stats)
    }

    fn select_shifts(
        &self,
        request: &ScheduleRequest,
        candidates_by_worker: &HashMap<String, Vec<ShiftCandidate>>,
        slot_state: &mut SlotState,
        block_state: &mut ShiftBlockState,
        start_state: &mut ShiftStartState,
    ) -> Vec<Selected> {
        let mut worker_order: Vec<&String> = candidates_by_worker.keys().collect();
        worker_order.sort_by_key(|id| candidates_by_worker[*id].len());

        let mut selected = Vec::new();

        for worker_id in worker_order {
            let candidates = &candidates_by_worker[worker_id];
            let mut best: Option<(f64, ShiftCandidate)> = None;

            for candidate in candidates {
                if let Some(score) = self.score_candidate(request, candidate, slot_state, block_state, start_state) {
                    if best.as_ref().map(|(b, _)| score > *b).unwrap_or(true) {
                        best = Some((score, *candidate));
                    }
                }
            }

            if let Some((_, candidate)) = best {
                for slot in candidate.start_slot..candidate.end_slot {
                    slot_state.on_floor_count[slot as usize] += 1;
                }
                if let Some(block) = request
                    .shift_block_configs
                    .iter()
                    .find(|b| b.contains_slot(candidate.start_slot))
                {
                    *block_state.counts.entry(block.name.clone()).or_insert(0) += 1;
                }
                if request
                    .shift_start_configs
                    .iter()
                    .any(|c| c.start_slot == candidate.start_slot)
                {
                    *start_state.counts.entry(candidate.start_slot).or_insert(0) += 1;
                }

                debug!(worker_id = %worker_id, start = candidate.start_slot, end = candidate.end_slot, "shift selected");
                selected.push(Selected {
                    worker_id: worker_id.clone(),
                    candidate,
                });
            }
        }

        selected.sort_by_key(|s| s.candidate.start_slot);
        selected
    }

    fn score_candidate(
        &self,
        request: &ScheduleRequest,
        candidate: &ShiftCandidate,
        slot_state: &SlotState,
        block_state: &ShiftBlockState,
        start_state: &ShiftStartState,
    ) -> Option<f64> {
        if let Some(block) = request
            .shift_block_configs
            .iter()
            .find(|b| b.contains_slot(candidate.start_slot))
        {
            let current = *block_state.counts.get(&block.name).unwrap_or(&0);
            if current >= block.max_associates {
                return None;
            }
        }
        if let Some(cfg) = request
            .shift_start_configs
            .iter()
            .find(|c| c.start_slot == candidate.start_slot)
        {
            let current = *start_state.counts.get(&cfg.start_slot).unwrap_or(&0);
            if current >= cfg.max_count {
                return None;
            }
        }

        let mut score = 0.0;
        for slot in candidate.start_slot..candidate.end_slot {
            let on_floor = slot_state.on_floor_count[slot as usize];
            score += if on_floor == 0 {
                10.0
            } else if on_floor < 3 {
                5.0
            } else if on_floor < 5 {
                2.0
            } else {
                1.0
            };
        }
        score += candidate.work_minutes as f64 / 100.0;

        if let Some(block) = request
            .shift_block_configs
            .iter()
            .find(|b| b.contains_slot(candidate.start_slot))
        {
            let current = *block_state.counts.get(&block.name).unwrap_or(&0);
            if current < block.target_associates {
                score += 5.0 * (block.target_associates - current) as f64;
            }
        }
        if let Some(cfg) = request
            .shift_start_configs
            .iter()
            .find(|c| c.start_slot == candidate.start_slot)
        {
            let current = *start_state.counts.get(&cfg.start_slot).unwrap_or(&0);
            if current < cfg.target_count {
                score += 10.0 * (cfg.target_count - current) as f64;
            }
        }

        Some(score)
    }

    fn place_lunch(
        &self,
        request: &ScheduleRequest,
        sel: &Selected,
        slot_state: &mut SlotState,
    ) -> ScheduleBlock {
        let candidate = sel.candidate;
        let (mut earliest, latest) = self.lunch_policy.lunch_window(
            candidate.start_slot,
            candidate.end_slot,
            candidate.lunch_slots,
            request.is_busy_day,
            request.slot_minutes,
        );

        let shift_mid = (candidate.start_slot + candidate.end_slot) / 2;
        let target = shift_mid.saturating_sub(candidate.lunch_slots / 2);

        let opening_cutoff_slots = (480u32.saturating_sub(request.day_start_minutes)) / request.slot_minutes;
        if candidate.start_slot < opening_cutoff_slots {
            earliest = earliest.max(target);
        }
        let earliest = earliest.min(latest);

        let mut best: Option<(f64, u32)> = None;
        for s in earliest..=latest {
            if s + candidate.lunch_slots > candidate.end_slot {
                continue;
            }
            let staggering = -100.0 * slot_state.lunch_start_count[s as usize] as f64;
            let overlap: u32 = (s..s + candidate.lunch_slots)
                .map(|slot| slot_state.on_lunch_count[slot as usize])
                .sum();
            let proximity = -0.5 * (s as i64 - target as i64).unsigned_abs() as f64;
            let score = staggering - overlap as f64 + proximity;

            if best.as_ref().map(|(b, _)| score > *b).unwrap_or(true) {
                best = Some((score, s));
            }
        }

        let chosen = best.map(|(_, s)| s).unwrap_or(earliest);
        for slot in chosen..chosen + candidate.lunch_slots {
            slot_state.on_lunch_count[slot as usize] += 1;
            slot_state.on_floor_count[slot as usize] =
                slot_state.on_floor_count[slot as usize].saturating_sub(1);
        }
        slot_state.lunch_start_count[chosen as usize] += 1;

        ScheduleBlock::new(chosen, chosen + candidate.lunch_slots)
    }

    fn place_breaks(
        &self,
        request: &ScheduleRequest,
        sel: &Selected,
        lunch_block: Option<ScheduleBlock>,
        slot_state: &mut SlotState,
    ) -> Vec<ScheduleBlock> {
        let candidate = sel.candidate;
        let targets = self.break_policy.target_positions(
            candidate.start_slot,
            candidate.end_slot,
            candidate.break_count,
            lunch_block,
        );
        let duration = self.break_policy.break_duration_slots(request.slot_minutes);
        let r = self.break_policy.max_break_variance_slots() as i64;

        let mut placed: Vec<ScheduleBlock> = Vec::new();

        for target in targets {
            let mut best: Option<(f64, ScheduleBlock)> = None;
            for offset in -r..=r {
                let pos = target as i64 + offset;
                if pos < candidate.start_slot as i64 {
                    continue;
                }
                let pos = pos as u32;
                if pos + duration > candidate.end_slot {
                    continue;
                }
                let block = ScheduleBlock::new(pos, pos + duration);
                if lunch_block.map(|l| l.overlaps(&block)).unwrap_or(false) {
                    continue;
                }
                if placed.iter().any(|p| p.overlaps(&block)) {
                    continue;
                }

                let on_floor: u32 = (pos..pos + duration)
                    .map(|s| slot_state.on_floor_count[s as usize])
                    .sum();
                let on_break: u32 = (pos..pos + duration)
                    .map(|s| slot_state.on_break_count[s as usize])
                    .sum();
                let score = 0.1 * on_floor as f64 - 5.0 * on_break as f64 - 2.0 * offset.unsigned_abs() as f64;

                if best.as_ref().map(|(b, _)| score > *b).unwrap_or(true) {
                    best = Some((score, block));
                }
            }

            if let Some((_, block)) = best {
                for slot in block.start_slot..block.end_slot {
                    slot_state.on_floor_count[slot as usize] =
                        slot_state.on_floor_count[slot as usize].saturating_sub(1);
                    slot_state.on_break_count[slot as usize] += 1;
                }
                placed.push(block);
            }
        }

        placed
    }

    fn assign_roles(
        &self,
        request: &ScheduleRequest,
        worker: &Worker,
        candidate: ShiftCandidate,
        lunch_block: Option<ScheduleBlock>,
        break_blocks: &[ScheduleBlock],
        slot_state: &mut SlotState,
    ) -> Vec<JobAssignment> {
        let intervals = on_floor_intervals(candidate, lunch_block, break_blocks);
        let opening_cutoff_slots = 60 / request.slot_minutes;
        let is_opener = candidate.start_slot < opening_cutoff_slots;

        let mut initial_role: Option<Role> = None;
        let mut assignments = Vec::new();

        for (idx, interval) in intervals.iter().enumerate() {
            let role = if idx == 0 {
                let role = self.select_role(worker, *interval, &request.role_caps, slot_state, None);
                initial_role = role;
                role
            } else {
                let preserve = match initial_role {
                    Some(_) if is_opener => true,
                    Some(r) if r.persists_mid_shift() => true,
                    _ => false,
                };
                if preserve {
                    self.select_role(worker, *interval, &request.role_caps, slot_state, initial_role)
                } else {
                    self.select_role(worker, *interval, &request.role_caps, slot_state, None)
                }
            };

            if let Some(role) = role {
                slot_state.bump_role(role, interval.start_slot..interval.end_slot, 1);
                assignments.push(JobAssignment {
                    role,
                    block: *interval,
                });
            }
        }

        assignments
    }

    /// Picks a role for `interval`. If `prefer` is set, tries to preserve
    /// that role first and only falls through to normal selection if it
    /// does not fit the caps across every slot of the interval.
    fn select_role(
        &self,
        worker: &Worker,
        interval: ScheduleBlock,
        caps: &CapTable,
        slot_state: &SlotState,
        prefer: Option<Role>,
    ) -> Option<Role> {
        let fits = |role: Role| -> bool {
            (interval.start_slot..interval.end_slot)
                .all(|slot| slot_state.role_count_at(role, slot) < caps.cap_at(slot, role))
        };

        if let Some(role) = prefer {
            if worker.can_do_role(role) && fits(role) {
                return Some(role);
            }
        }

        for role in Role::SPECIALIZED_PRIORITY {
            if worker.can_do_role(role)
                && worker.preference_for(role) != crate::domain::Preference::Avoid
                && fits(role)
            {
                return Some(role);
            }
        }

        if worker.can_do_role(Role::Picking) && fits(Role::Picking) {
            return Some(Role::Picking);
        }

        for role in worker.eligible_roles() {
            if fits(role) {
                return Some(role);
            }
        }

        // Nothing fits the caps: assign the worker's first eligible role
        // anyway so every on-floor slot ends up with exactly one role
        // assignment. The validator will flag any resulting cap overage.
        worker.eligible_roles().into_iter().next()
    }
}

fn on_floor_intervals(
    candidate: ShiftCandidate,
    lunch_block: Option<ScheduleBlock>,
    break_blocks: &[ScheduleBlock],
) -> Vec<ScheduleBlock> {
    let is_off = |slot: u32| -> bool {
        lunch_block.map(|b| b.contains_slot(slot)).unwrap_or(false)
            || break_blocks.iter().any(|b| b.contains_slot(slot))
    };

    let mut intervals = Vec::new();
    let mut current_start: Option<u32> = None;
    for slot in candidate.start_slot..candidate.end_slot {
        if !is_off(slot) {
            current_start.get_or_insert(slot);
        } else if let Some(start) = current_start.take() {
            intervals.push(ScheduleBlock::new(start, slot));
        }
    }
    if let Some(start) = current_start {
        intervals.push(ScheduleBlock::new(start, candidate.end_slot));
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, DefaultBreakPolicy, DefaultLunchPolicy, DefaultShiftPolicy};
    use crate::scheduling::candidate::CandidateGenerator;
    use chrono::NaiveDate;

    fn policies() -> (DefaultShiftPolicy, DefaultLunchPolicy, DefaultBreakPolicy) {
        (
            DefaultShiftPolicy::default(),
            DefaultLunchPolicy::default(),
            DefaultBreakPolicy::default(),
        )
    }

    #[test]
    fn s1_minimal_single_worker_gets_one_shift_with_picking() {
        let (sp, lp, bp) = policies();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let solver = HeuristicSolver::new(&sp, &lp, &bp);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, Availability::window(12, 44));
        let request = ScheduleRequest::new(date, vec![worker.clone()]);

        let candidates = gen.generate_all(&request, request.step_slots);
        let (day, stats) = solver.solve(&request, &candidates);

        assert_eq!(stats.workers_scheduled, 1);
        let assignment = day.assignments.get("w1").unwrap();
        assert_eq!(assignment.work_minutes(), 420);
        assert_eq!(assignment.lunch_minutes(), 60);
        assert_eq!(assignment.break_blocks.len(), 2);
        for ja in &assignment.job_assignments {
            assert_eq!(ja.role, Role::Picking);
        }
    }

    #[test]
    fn s2_cap_enforcement_limits_gmd_sm_to_two() {
        let (sp, lp, bp) = policies();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let solver = HeuristicSolver::new(&sp, &lp, &bp);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut workers = Vec::new();
        for i in 0..5 {
            let mut w = Worker::new(format!("w{i}"), format!("Worker {i}"));
            w.availability.insert(date, Availability::window(12, 44));
            workers.push(w);
        }

        let mut request = ScheduleRequest::new(date, workers);
        request.role_caps.global.insert(Role::GmdSm, 2);
        request.role_caps.global.insert(Role::Picking, 999);

        let candidates = gen.generate_all(&request, request.step_slots);
        let (day, _stats) = solver.solve(&request, &candidates);

        for slot in 12..44 {
            assert!(day.role_coverage_at(slot, Role::GmdSm) <= 2);
        }
    }

    #[test]
    fn s3_lunch_staggering_produces_distinct_starts() {
        let (sp, lp, bp) = policies();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let solver = HeuristicSolver::new(&sp, &lp, &bp);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut workers = Vec::new();
        for i in 0..10 {
            let mut w = Worker::new(format!("w{i}"), format!("Worker {i}"));
            w.availability.insert(date, Availability::window(0, 36));
            workers.push(w);
        }
        let request = ScheduleRequest::new(date, workers);
        let candidates = gen.generate_all(&request, request.step_slots);
        let (day, _stats) = solver.solve(&request, &candidates);

        let mut lunch_starts: Vec<u32> = day
            .assignments
            .values()
            .filter_map(|a| a.lunch_block.map(|b| b.start_slot))
            .collect();
        lunch_starts.sort();
        let mut duplicates = 0;
        for w in lunch_starts.windows(2) {
            if w[0] == w[1] {
                duplicates += 1;
            }
        }
        assert!(duplicates <= 1);
    }

    #[test]
    fn s6_opener_picking_persists_across_breaks() {
        let (sp, lp, bp) = policies();
        let gen = CandidateGenerator::new(&sp, &lp, &bp);
        let solver = HeuristicSolver::new(&sp, &lp, &bp);

        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut worker = Worker::new("w1", "Ann");
        worker.availability.insert(date, Availability::window(0, 36));
        let mut request = ScheduleRequest::new(date, vec![worker.clone()]);
        request.role_caps.global.insert(Role::GmdSm, 0);
        request.role_caps.global.insert(Role::ExceptionSm, 0);
        request.role_caps.global.insert(Role::Staging, 0);
        request.role_caps.global.insert(Role::Backroom, 0);
        request.role_caps.global.insert(Role::Sr, 0);

        let candidates = gen.generate_all(&request, request.step_slots);
        let (day, _stats) = solver.solve(&request, &candidates);

        let assignment = day.assignments.get("w1").unwrap();
        assert!(assignment.job_assignments.len() >= 2);
        for ja in &assignment.job_assignments {
            assert_eq!(ja.role, Role::Picking);
        }
    }
}
