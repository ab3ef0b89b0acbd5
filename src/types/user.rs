use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::unit::UnitId;

pub type UserId = i64;

/// Rank/role of a user within the chain of command.
///
/// `Commander` is the owner of a self-registered unit. `Admin` is granted both
/// to the reserved system administrator and to commanders who register a unit;
/// only the reserved identity gets global access (see `AccessResolver`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Soldier")]
    Soldier,
    #[serde(rename = "Team Leader")]
    TeamLeader,
    #[serde(rename = "Squad Leader")]
    SquadLeader,
    #[serde(rename = "Platoon Sergeant")]
    PlatoonSergeant,
    #[serde(rename = "Platoon Leader")]
    PlatoonLeader,
    #[serde(rename = "First Sergeant")]
    FirstSergeant,
    #[serde(rename = "Company Commander")]
    CompanyCommander,
    #[serde(rename = "Battalion Commander")]
    BattalionCommander,
    #[serde(rename = "Commander")]
    Commander,
    #[serde(rename = "Admin")]
    Admin,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Soldier,
        Role::TeamLeader,
        Role::SquadLeader,
        Role::PlatoonSergeant,
        Role::PlatoonLeader,
        Role::FirstSergeant,
        Role::CompanyCommander,
        Role::BattalionCommander,
        Role::Commander,
        Role::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Soldier => "Soldier",
            Role::TeamLeader => "Team Leader",
            Role::SquadLeader => "Squad Leader",
            Role::PlatoonSergeant => "Platoon Sergeant",
            Role::PlatoonLeader => "Platoon Leader",
            Role::FirstSergeant => "First Sergeant",
            Role::CompanyCommander => "Company Commander",
            Role::BattalionCommander => "Battalion Commander",
            Role::Commander => "Commander",
            Role::Admin => "Admin",
            Role::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    /// Canonical primary unit
    pub unit_id: Option<UnitId>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            unit_id: None,
            is_deleted: false,
        }
    }

    pub fn with_unit(mut self, unit_id: UnitId) -> Self {
        self.unit_id = Some(unit_id);
        self
    }
}

/// How a user is attached to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    #[default]
    Primary,
    Attached,
    Temporary,
}

impl AssignmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentKind::Primary => "primary",
            AssignmentKind::Attached => "attached",
            AssignmentKind::Temporary => "temporary",
        }
    }
}

/// Many-to-many user/unit relation. Only a primary assignment feeds back
/// into `User::unit_id`; the others play no part in access resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAssignment {
    pub user_id: UserId,
    pub unit_id: UnitId,
    pub kind: AssignmentKind,
    pub assigned_at: DateTime<Utc>,
}
