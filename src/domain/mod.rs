//! Domain model: slots, blocks, workers, requests, demand curves, and the
//! pluggable shift/lunch/break policies the scheduling engine depends on.

pub mod availability;
pub mod block;
pub mod day_schedule;
pub mod demand;
pub mod policies;
pub mod request;
pub mod roles;
pub mod shift;
pub mod week_schedule;
pub mod worker;

pub use availability::Availability;
pub use block::ScheduleBlock;
pub use day_schedule::DaySchedule;
pub use demand::{DemandCurve, DemandMetrics, DemandPoint, DemandPriority, DemandProfile, WeeklyDemand};
pub use policies::{BreakPolicy, DefaultBreakPolicy, DefaultLunchPolicy, DefaultShiftPolicy, LunchPolicy, ShiftPolicy};
pub use request::{CapTable, DaysOffPattern, FairnessConfig, ScheduleRequest, ShiftBlockConfig, ShiftStartConfig, WeeklyScheduleRequest};
pub use roles::{Preference, Role, UNBOUNDED_CAP};
pub use shift::{JobAssignment, ShiftAssignment};
pub use week_schedule::{FairnessMetrics, WeeklySchedule};
pub use worker::Worker;
