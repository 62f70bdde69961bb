use serde::{Deserialize, Serialize};

/// A job role a worker can be assigned while on-floor.
///
/// `Picking` is the non-specialized default; the remaining five are
/// "specialized" roles in the priority order used by role assignment
/// (see [`crate::scheduling::heuristic`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Picking,
    GmdSm,
    ExceptionSm,
    Staging,
    Backroom,
    Sr,
}

impl Role {
    /// All roles, in the specialized-assignment priority order used by
    /// phase 4 of the heuristic solver (picking excluded; it is tried
    /// only after every specialized role fails).
    pub const SPECIALIZED_PRIORITY: [Role; 5] = [
        Role::GmdSm,
        Role::ExceptionSm,
        Role::Staging,
        Role::Backroom,
        Role::Sr,
    ];

    /// Roles eligible for "persistence" across intervals when a shift did
    /// not start in the opening hour (see role persistence rules).
    pub fn persists_mid_shift(self) -> bool {
        matches!(
            self,
            Role::GmdSm | Role::ExceptionSm | Role::Sr | Role::Backroom
        )
    }

    pub fn all() -> [Role; 6] {
        [
            Role::Picking,
            Role::GmdSm,
            Role::ExceptionSm,
            Role::Staging,
            Role::Backroom,
            Role::Sr,
        ]
    }
}

/// A worker's stated preference toward a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Preference {
    Avoid,
    Neutral,
    Prefer,
}

impl Preference {
    pub fn score(self) -> i32 {
        match self {
            Preference::Avoid => -1,
            Preference::Neutral => 0,
            Preference::Prefer => 1,
        }
    }
}

/// Unbounded-cap sentinel used throughout role-cap tables.
pub const UNBOUNDED_CAP: u32 = 999;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialized_priority_excludes_picking() {
        assert!(!Role::SPECIALIZED_PRIORITY.contains(&Role::Picking));
        assert_eq!(Role::SPECIALIZED_PRIORITY.len(), 5);
    }

    #[test]
    fn persistence_set_matches_spec() {
        assert!(Role::GmdSm.persists_mid_shift());
        assert!(Role::Sr.persists_mid_shift());
        assert!(!Role::Picking.persists_mid_shift());
        assert!(!Role::Staging.persists_mid_shift());
    }
}
