use std::collections::HashMap;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::domain::DemandPriority;
use crate::scheduling::{FairnessConfig, OptimizationMode, SolverConfig, SolverType};

/// Layered engine configuration: `config/default.toml`, an optional
/// `config/{RUN_ENV}.toml` override, then `APP__`-prefixed environment
/// variables, in that priority order.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub day_start_minutes: u32,
    pub day_end_minutes: u32,
    pub slot_minutes: u32,
    pub solver: SolverConfig,
    pub fairness: FairnessConfig,
    pub demand_aware: DemandAwareConfig,
}

/// Controls whether and how demand curves drive the solver.
#[derive(Debug, Clone)]
pub struct DemandAwareConfig {
    pub solver_type: SolverType,
    pub solver_config: SolverConfig,
    pub auto_generate_demand: bool,
    pub track_demand_metrics: bool,
}

impl Default for DemandAwareConfig {
    fn default() -> Self {
        Self {
            solver_type: SolverType::Hybrid,
            solver_config: SolverConfig::default(),
            auto_generate_demand: true,
            track_demand_metrics: true,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            day_start_minutes: 300,
            day_end_minutes: 1320,
            slot_minutes: 15,
            solver: SolverConfig::default(),
            fairness: FairnessConfig::default(),
            demand_aware: DemandAwareConfig::default(),
        }
    }
}

/// Deserializable shadow of [`EngineSettings`] the `config` crate reads
/// layered sources into, before being converted into the richer types the
/// rest of the engine uses.
#[derive(Debug, Deserialize, Clone)]
struct RawSettings {
    #[serde(default = "default_day_start_minutes")]
    day_start_minutes: u32,
    #[serde(default = "default_day_end_minutes")]
    day_end_minutes: u32,
    #[serde(default = "default_slot_minutes")]
    slot_minutes: u32,
    #[serde(default)]
    solver: RawSolverConfig,
    #[serde(default)]
    fairness: RawFairnessConfig,
    #[serde(default)]
    demand_aware: RawDemandAwareConfig,
}

fn default_day_start_minutes() -> u32 {
    300
}
fn default_day_end_minutes() -> u32 {
    1320
}
fn default_slot_minutes() -> u32 {
    15
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
struct RawSolverConfig {
    time_limit_seconds: f64,
    num_workers: u32,
    optimization_mode: OptimizationMode,
    demand_weight: i64,
    coverage_weight: i64,
    fairness_weight: i64,
    preference_weight: i64,
    undercoverage_penalty: i64,
    overcoverage_penalty: i64,
    priority_multipliers: HashMap<DemandPriority, f64>,
    enforce_min_demand: bool,
}

impl Default for RawSolverConfig {
    fn default() -> Self {
        let d = SolverConfig::default();
        Self {
            time_limit_seconds: d.time_limit_seconds,
            num_workers: d.num_workers,
            optimization_mode: d.optimization_mode,
            demand_weight: d.demand_weight,
            coverage_weight: d.coverage_weight,
            fairness_weight: d.fairness_weight,
            preference_weight: d.preference_weight,
            undercoverage_penalty: d.undercoverage_penalty,
            overcoverage_penalty: d.overcoverage_penalty,
            priority_multipliers: d.priority_multipliers,
            enforce_min_demand: d.enforce_min_demand,
        }
    }
}

impl From<RawSolverConfig> for SolverConfig {
    fn from(raw: RawSolverConfig) -> Self {
        Self {
            time_limit_seconds: raw.time_limit_seconds,
            num_workers: raw.num_workers,
            optimization_mode: raw.optimization_mode,
            demand_weight: raw.demand_weight,
            coverage_weight: raw.coverage_weight,
            fairness_weight: raw.fairness_weight,
            preference_weight: raw.preference_weight,
            undercoverage_penalty: raw.undercoverage_penalty,
            overcoverage_penalty: raw.overcoverage_penalty,
            priority_multipliers: raw.priority_multipliers,
            enforce_min_demand: raw.enforce_min_demand,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
struct RawFairnessConfig {
    target_weekly_minutes: Option<u32>,
    min_weekly_minutes: u32,
    max_hours_variance: f64,
    weight_hours_balance: f64,
    weight_days_balance: f64,
}

impl Default for RawFairnessConfig {
    fn default() -> Self {
        let d = FairnessConfig::default();
        Self {
            target_weekly_minutes: d.target_weekly_minutes,
            min_weekly_minutes: d.min_weekly_minutes,
            max_hours_variance: d.max_hours_variance,
            weight_hours_balance: d.weight_hours_balance,
            weight_days_balance: d.weight_days_balance,
        }
    }
}

impl From<RawFairnessConfig> for FairnessConfig {
    fn from(raw: RawFairnessConfig) -> Self {
        Self {
            target_weekly_minutes: raw.target_weekly_minutes,
            min_weekly_minutes: raw.min_weekly_minutes,
            max_hours_variance: raw.max_hours_variance,
            weight_hours_balance: raw.weight_hours_balance,
            weight_days_balance: raw.weight_days_balance,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
struct RawDemandAwareConfig {
    solver_type: SolverType,
    auto_generate_demand: bool,
    track_demand_metrics: bool,
}

impl Default for RawDemandAwareConfig {
    fn default() -> Self {
        let d = DemandAwareConfig::default();
        Self {
            solver_type: d.solver_type,
            auto_generate_demand: d.auto_generate_demand,
            track_demand_metrics: d.track_demand_metrics,
        }
    }
}

impl EngineSettings {
    /// Loads `config/default.{toml,yaml,...}`, then `config/{RUN_ENV}.*`
    /// if present, then `APP__`-prefixed environment variables
    /// (`APP__SOLVER__TIME_LIMIT_SECONDS=15`, double underscore as the
    /// nesting separator), falling back to built-in defaults when none of
    /// those sources exist.
    pub fn new() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let raw: RawSettings = config.try_deserialize().unwrap_or_else(|_| RawSettings {
            day_start_minutes: default_day_start_minutes(),
            day_end_minutes: default_day_end_minutes(),
            slot_minutes: default_slot_minutes(),
            solver: RawSolverConfig::default(),
            fairness: RawFairnessConfig::default(),
            demand_aware: RawDemandAwareConfig::default(),
        });

        Ok(Self {
            day_start_minutes: raw.day_start_minutes,
            day_end_minutes: raw.day_end_minutes,
            slot_minutes: raw.slot_minutes,
            solver: raw.solver.clone().into(),
            fairness: raw.fairness.into(),
            demand_aware: DemandAwareConfig {
                solver_type: raw.demand_aware.solver_type,
                solver_config: raw.solver.into(),
                auto_generate_demand: raw.demand_aware.auto_generate_demand,
                track_demand_metrics: raw.demand_aware.track_demand_metrics,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let settings = EngineSettings::default();
        assert_eq!(settings.day_start_minutes, 300);
        assert_eq!(settings.day_end_minutes, 1320);
        assert_eq!(settings.slot_minutes, 15);
        assert_eq!(settings.solver.time_limit_seconds, 30.0);
        assert_eq!(settings.solver.demand_weight, 40);
        assert_eq!(settings.demand_aware.solver_type, SolverType::Hybrid);
    }
}
