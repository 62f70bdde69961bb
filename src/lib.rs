//! Staff work-schedule generation engine.
//!
//! Turns a roster of workers, their availability, and a day or week
//! window into a slot-by-slot schedule: which workers are on shift, when
//! they take lunch and breaks, and which role they cover on the floor at
//! any moment. Candidate shift skeletons are enumerated, then selected
//! either by a deterministic greedy heuristic or by a constraint-
//! programming formulation scored against an optional demand curve.
//! Weekly coordination layers days-off pattern enforcement and fairness
//! balancing on top of either solver. An independent validator checks the
//! result against every constraint a produced schedule must satisfy.

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod output;
pub mod scheduling;
pub mod validation;

pub use error::{ScheduleError, ScheduleResult};
pub use scheduling::{solve_day, solve_day_cp, solve_week};
