//! Adjuster selection for newly filed claims

use serde::{Deserialize, Serialize};

use core_kernel::UserId;

/// An adjuster on the roster with their current open claim count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjusterLoad {
    pub adjuster_id: UserId,
    pub name: String,
    pub open_claims: u32,
}

/// Picks the adjuster with the fewest open claims.
///
/// Ties go to whoever comes first in the roster, so callers must supply a
/// stable ordering. Returns `None` for an empty roster; the claim is then
/// filed unassigned.
pub fn select_adjuster(roster: &[AdjusterLoad]) -> Option<&AdjusterLoad> {
    roster.iter().min_by_key(|a| a.open_claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(name: &str, open_claims: u32) -> AdjusterLoad {
        AdjusterLoad {
            adjuster_id: UserId::new(),
            name: name.to_string(),
            open_claims,
        }
    }

    #[test]
    fn test_fewest_open_claims_wins() {
        let roster = vec![load("Ada", 7), load("Ben", 2), load("Cy", 4)];
        assert_eq!(select_adjuster(&roster).unwrap().name, "Ben");
    }

    #[test]
    fn test_tie_goes_to_first_in_roster() {
        let roster = vec![load("Ada", 3), load("Ben", 1), load("Cy", 1)];
        assert_eq!(select_adjuster(&roster).unwrap().name, "Ben");
    }

    #[test]
    fn test_empty_roster() {
        assert!(select_adjuster(&[]).is_none());
    }
}
