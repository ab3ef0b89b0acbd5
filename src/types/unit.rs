use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UnitId = i64;

/// Organizational size tier of a unit, smallest to largest.
///
/// `Unknown` absorbs malformed stored values; it ranks 0 and never
/// appears in an access policy, so anything carrying it is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Echelon {
    Team,
    Squad,
    Platoon,
    Company,
    Battalion,
    #[serde(other)]
    Unknown,
}

impl Echelon {
    /// Every valid echelon in ascending order.
    pub const ALL: [Echelon; 5] = [
        Echelon::Team,
        Echelon::Squad,
        Echelon::Platoon,
        Echelon::Company,
        Echelon::Battalion,
    ];

    /// Position in the chain of command. Higher is more senior.
    pub fn rank(self) -> u8 {
        match self {
            Echelon::Team => 1,
            Echelon::Squad => 2,
            Echelon::Platoon => 3,
            Echelon::Company => 4,
            Echelon::Battalion => 5,
            Echelon::Unknown => 0,
        }
    }

    /// All valid echelons at or below this one.
    pub fn and_below(self) -> Vec<Echelon> {
        Self::ALL
            .into_iter()
            .filter(|e| e.rank() <= self.rank())
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Echelon::Team => "team",
            Echelon::Squad => "squad",
            Echelon::Platoon => "platoon",
            Echelon::Company => "company",
            Echelon::Battalion => "battalion",
            Echelon::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Echelon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An organizational unit. `parent_id` is a weak reference; the unit tree
/// resolves it by id and never owns the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub parent_id: Option<UnitId>,
    pub echelon: Echelon,
    #[serde(default)]
    pub referral_code: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Unit {
    pub fn new(id: UnitId, name: impl Into<String>, echelon: Echelon) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            echelon,
            referral_code: String::new(),
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn with_parent(mut self, parent_id: UnitId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_referral_code(mut self, code: impl Into<String>) -> Self {
        self.referral_code = code.into();
        self
    }

    /// Marks the unit soft-deleted now.
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.deleted_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echelon_rank_order() {
        let ranks: Vec<u8> = Echelon::ALL.iter().map(|e| e.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(Echelon::Unknown.rank(), 0);
    }

    #[test]
    fn test_echelon_and_below() {
        assert_eq!(
            Echelon::Squad.and_below(),
            vec![Echelon::Team, Echelon::Squad]
        );
        assert!(Echelon::Unknown.and_below().is_empty());
    }

    #[test]
    fn test_echelon_serde_unknown_fallback() {
        let parsed: Echelon = serde_json::from_str("\"division\"").unwrap();
        assert_eq!(parsed, Echelon::Unknown);

        let platoon: Echelon = serde_json::from_str("\"platoon\"").unwrap();
        assert_eq!(platoon, Echelon::Platoon);
    }
}
