//! Named interfaces for schedule presentation collaborators that live
//! outside this engine's scope: PDF rendering and any other document
//! export format. The CLI only ever calls [`SummaryWriter`], which this
//! crate implements directly as a plain-text renderer.

use std::fmt::Write as _;

use crate::domain::{DaySchedule, WeeklySchedule};
use crate::validation::ValidationResult;

/// A rendering backend that turns a produced schedule into some external
/// artifact (PDF, spreadsheet, ...). No implementation ships in this
/// crate; the CLI's `--output` flag names a path for a future renderer to
/// write to without this engine owning that format.
pub trait ScheduleRenderer {
    fn render_day(&self, day: &DaySchedule) -> Result<Vec<u8>, String>;
    fn render_week(&self, week: &WeeklySchedule) -> Result<Vec<u8>, String>;
}

/// Produces the plain-text summaries the CLI prints to stdout.
pub trait SummaryWriter {
    fn summarize_day(&self, day: &DaySchedule, validation: &ValidationResult) -> String;
    fn summarize_week(&self, week: &WeeklySchedule, validation: &ValidationResult) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextSummaryWriter;

impl SummaryWriter for PlainTextSummaryWriter {
    fn summarize_day(&self, day: &DaySchedule, validation: &ValidationResult) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Schedule for {}", day.schedule_date);
        let _ = writeln!(out, "  workers scheduled: {}", day.assignments.len());

        let peak = (0..day.total_slots).map(|slot| day.coverage_at(slot)).max().unwrap_or(0);
        let _ = writeln!(out, "  peak coverage: {peak}");

        if validation.errors.is_empty() {
            let _ = writeln!(out, "  validation: OK");
        } else {
            let _ = writeln!(out, "  validation errors: {}", validation.errors.len());
            for error in &validation.errors {
                let _ = writeln!(out, "    - {}", error.message);
            }
        }
        if !validation.warnings.is_empty() {
            let _ = writeln!(out, "  validation warnings: {}", validation.warnings.len());
            for warning in &validation.warnings {
                let _ = writeln!(out, "    - {}", warning.message);
            }
        }
        out
    }

    fn summarize_week(&self, week: &WeeklySchedule, validation: &ValidationResult) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Schedule for {} .. {}", week.start_date, week.end_date);
        let _ = writeln!(out, "  days scheduled: {}", week.days.len());

        if let Some(metrics) = &week.fairness_metrics {
            let _ = writeln!(
                out,
                "  fairness: avg {:.0}min min {} max {} stddev {:.1}min",
                metrics.avg_weekly_minutes, metrics.min_weekly_minutes, metrics.max_weekly_minutes, metrics.hours_variance_minutes
            );
        }

        if validation.errors.is_empty() {
            let _ = writeln!(out, "  validation: OK");
        } else {
            let _ = writeln!(out, "  validation errors: {}", validation.errors.len());
            for error in &validation.errors {
                let _ = writeln!(out, "    - {}", error.message);
            }
        }
        if !validation.warnings.is_empty() {
            let _ = writeln!(out, "  validation warnings: {}", validation.warnings.len());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationResult;
    use chrono::NaiveDate;

    #[test]
    fn summary_reports_clean_validation() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let day = DaySchedule::new(date, 15, 68);
        let result = ValidationResult::default();
        let summary = PlainTextSummaryWriter.summarize_day(&day, &result);
        assert!(summary.contains("validation: OK"));
    }
}
