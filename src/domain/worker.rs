use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::availability::Availability;
use super::roles::{Preference, Role};

/// A schedulable worker.
///
/// Eligibility is derived, never stored directly: `allowed_roles \
/// forbidden_roles`. An empty effective set means the worker can never
/// receive a role assignment and must not be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub display_name: String,
    pub availability: HashMap<NaiveDate, Availability>,
    pub max_minutes_per_day: u32,
    pub max_minutes_per_week: u32,
    pub allowed_roles: HashSet<Role>,
    pub forbidden_roles: HashSet<Role>,
    pub role_preferences: HashMap<Role, Preference>,
}

impl Worker {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            availability: HashMap::new(),
            max_minutes_per_day: 480,
            max_minutes_per_week: 2400,
            allowed_roles: Role::all().into_iter().collect(),
            forbidden_roles: HashSet::new(),
            role_preferences: HashMap::new(),
        }
    }

    pub fn get_availability(&self, date: NaiveDate) -> Availability {
        self.availability
            .get(&date)
            .copied()
            .unwrap_or_else(Availability::off_day)
    }

    /// The effective role set this worker may be assigned: `allowed \
    /// forbidden`.
    pub fn eligible_roles(&self) -> HashSet<Role> {
        self.allowed_roles
            .difference(&self.forbidden_roles)
            .copied()
            .collect()
    }

    pub fn can_do_role(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role) && !self.forbidden_roles.contains(&role)
    }

    pub fn preference_for(&self, role: Role) -> Preference {
        self.role_preferences
            .get(&role)
            .copied()
            .unwrap_or(Preference::Neutral)
    }

    /// Count of PREFER roles minus count of AVOID roles among this
    /// worker's effective eligibility, used by the CP preference term.
    pub fn preference_balance(&self) -> i32 {
        self.eligible_roles()
            .iter()
            .map(|role| self.preference_for(*role).score())
            .sum()
    }

    pub fn is_schedulable(&self) -> bool {
        !self.eligible_roles().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_eligibility_is_not_schedulable() {
        let mut w = Worker::new("w1", "Ann");
        w.forbidden_roles = w.allowed_roles.clone();
        assert!(w.eligible_roles().is_empty());
        assert!(!w.is_schedulable());
    }

    #[test]
    fn preference_balance_counts_prefer_and_avoid() {
        let mut w = Worker::new("w1", "Ann");
        w.role_preferences.insert(Role::GmdSm, Preference::Prefer);
        w.role_preferences.insert(Role::Backroom, Preference::Avoid);
        assert_eq!(w.preference_balance(), 0);
    }

    #[test]
    fn missing_availability_defaults_to_off() {
        let w = Worker::new("w1", "Ann");
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert!(w.get_availability(date).is_off());
    }
}
