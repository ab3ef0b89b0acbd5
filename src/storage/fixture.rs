//! JSON fixture import.
//!
//! A fixture is a whole organization snapshot (units, users, assignments,
//! events, participation and AARs) loaded in a single transaction. Input is
//! validated up front; nothing is written if any record is malformed.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::Database;
use super::org_store::{
    generate_referral_code, insert_aar, insert_event, insert_participant, insert_unit,
    insert_user, upsert_assignment,
};
use crate::types::{
    Aar, AarError, AssignmentKind, Echelon, EventId, Result, ResultExt, Role, TrainingEvent, Unit,
    UnitAssignment, UnitId, User, UserId, ValidationErrorKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureAssignment {
    pub user_id: UserId,
    pub unit_id: UnitId,
    #[serde(default)]
    pub kind: AssignmentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub event_id: EventId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub units: Vec<Unit>,
    pub users: Vec<User>,
    pub assignments: Vec<FixtureAssignment>,
    pub events: Vec<TrainingEvent>,
    pub participants: Vec<Participation>,
    pub aars: Vec<Aar>,
}

/// Rows written by [`Fixture::import`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub units: usize,
    pub users: usize,
    pub assignments: usize,
    pub events: usize,
    pub participants: usize,
    pub aars: usize,
}

fn invalid(kind: ValidationErrorKind, field: String, message: impl Into<String>) -> AarError {
    AarError::invalid(kind, field, message)
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context_fn(|| format!("Failed to read fixture {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Reject malformed records before anything is written.
    pub fn validate(&self) -> Result<()> {
        let mut unit_ids = HashSet::new();
        for (i, unit) in self.units.iter().enumerate() {
            if !unit_ids.insert(unit.id) {
                return Err(invalid(
                    ValidationErrorKind::Duplicate,
                    format!("units[{}].id", i),
                    format!("unit id {} appears twice", unit.id),
                ));
            }
            if unit.name.trim().is_empty() {
                return Err(invalid(
                    ValidationErrorKind::MissingField,
                    format!("units[{}].name", i),
                    "unit name must not be empty",
                ));
            }
            if unit.echelon == Echelon::Unknown {
                return Err(invalid(
                    ValidationErrorKind::Format,
                    format!("units[{}].echelon", i),
                    "unknown echelon",
                ));
            }
            if unit.parent_id == Some(unit.id) {
                return Err(invalid(
                    ValidationErrorKind::Hierarchy,
                    format!("units[{}].parent_id", i),
                    "unit cannot be its own parent",
                ));
            }
        }
        self.check_unit_cycles()?;

        let mut user_ids = HashSet::new();
        let mut usernames = HashSet::new();
        for (i, user) in self.users.iter().enumerate() {
            if !user_ids.insert(user.id) {
                return Err(invalid(
                    ValidationErrorKind::Duplicate,
                    format!("users[{}].id", i),
                    format!("user id {} appears twice", user.id),
                ));
            }
            if user.username.trim().is_empty() {
                return Err(invalid(
                    ValidationErrorKind::MissingField,
                    format!("users[{}].username", i),
                    "username must not be empty",
                ));
            }
            if !usernames.insert(user.username.as_str()) {
                return Err(invalid(
                    ValidationErrorKind::Duplicate,
                    format!("users[{}].username", i),
                    format!("username '{}' appears twice", user.username),
                ));
            }
            if user.role == Role::Unknown {
                return Err(invalid(
                    ValidationErrorKind::Format,
                    format!("users[{}].role", i),
                    "unknown role",
                ));
            }
        }

        let mut pairs = HashSet::new();
        for (i, aar) in self.aars.iter().enumerate() {
            if !pairs.insert((aar.event_id, aar.created_by)) {
                return Err(invalid(
                    ValidationErrorKind::Duplicate,
                    format!("aars[{}]", i),
                    format!(
                        "user {} has two AARs for event {}",
                        aar.created_by, aar.event_id
                    ),
                ));
            }
        }

        Ok(())
    }

    fn check_unit_cycles(&self) -> Result<()> {
        let parents: HashMap<UnitId, Option<UnitId>> =
            self.units.iter().map(|u| (u.id, u.parent_id)).collect();

        for unit in &self.units {
            let mut visited = HashSet::new();
            let mut current = Some(unit.id);
            while let Some(id) = current {
                if !visited.insert(id) {
                    return Err(invalid(
                        ValidationErrorKind::Hierarchy,
                        format!("units[id={}].parent_id", unit.id),
                        "parent links form a cycle",
                    ));
                }
                current = parents.get(&id).copied().flatten();
            }
        }
        Ok(())
    }

    /// Validate, then write every record atomically.
    pub fn import(&self, db: &Database) -> Result<ImportSummary> {
        self.validate()?;

        let mut units = self.units.clone();
        for unit in units.iter_mut().filter(|u| u.referral_code.is_empty()) {
            unit.referral_code = generate_referral_code();
        }
        let now = chrono::Utc::now();
        let assignments: Vec<UnitAssignment> = self
            .assignments
            .iter()
            .map(|a| UnitAssignment {
                user_id: a.user_id,
                unit_id: a.unit_id,
                kind: a.kind,
                assigned_at: now,
            })
            .collect();

        let fixture = self;
        let summary = db.transaction(move |conn| {
            for unit in &units {
                insert_unit(conn, unit)?;
            }
            for user in &fixture.users {
                insert_user(conn, user)?;
            }
            for assignment in &assignments {
                upsert_assignment(conn, assignment)?;
            }
            for event in &fixture.events {
                insert_event(conn, event)?;
            }
            for p in &fixture.participants {
                insert_participant(conn, p.event_id, p.user_id)?;
            }
            for aar in &fixture.aars {
                insert_aar(conn, aar)?;
            }

            Ok(ImportSummary {
                units: units.len(),
                users: fixture.users.len(),
                assignments: assignments.len(),
                events: fixture.events.len(),
                participants: fixture.participants.len(),
                aars: fixture.aars.len(),
            })
        })?;

        info!(
            units = summary.units,
            users = summary.users,
            events = summary.events,
            aars = summary.aars,
            "Imported fixture"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OrgDirectory, OrgStore};

    const FIXTURE: &str = r#"{
        "units": [
            {"id": 1, "name": "Alpha Company", "parent_id": null, "echelon": "company"},
            {"id": 2, "name": "1st Platoon", "parent_id": 1, "echelon": "platoon", "referral_code": "PLT1CODE"}
        ],
        "users": [
            {"id": 10, "username": "cpt.price", "role": "Company Commander", "unit_id": null},
            {"id": 11, "username": "lt.dan", "role": "Platoon Leader", "unit_id": 2}
        ],
        "assignments": [{"user_id": 10, "unit_id": 1}],
        "events": [{"id": 100, "name": "Platoon STX", "unit_id": 2, "starts_at": "2025-03-01T06:00:00Z"}],
        "participants": [{"event_id": 100, "user_id": 10}],
        "aars": [{
            "id": 500, "event_id": 100, "unit_id": 2, "created_by": 11,
            "improve_items": [{"text": "Radio checks were late.", "author_id": 11, "unit_id": 2, "unit_level": "platoon"}]
        }]
    }"#;

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_import_writes_everything() {
        let db = db();
        let summary = Fixture::from_json(FIXTURE).unwrap().import(&db).unwrap();
        assert_eq!(summary.units, 2);
        assert_eq!(summary.aars, 1);

        let store = OrgStore::new(&db);
        // Primary assignment rewrote the user's unit
        assert_eq!(store.user(10).unwrap().unwrap().unit_id, Some(1));
        assert!(!store.unit(1).unwrap().unwrap().referral_code.is_empty());
        assert_eq!(store.unit(2).unwrap().unwrap().referral_code, "PLT1CODE");

        let aar = store.aar(500).unwrap().unwrap();
        assert_eq!(aar.improve_items.len(), 1);
        assert!(!aar.improve_items[0].id.is_empty());

        let directory: &dyn OrgDirectory = &db;
        assert!(directory.participated_event_ids(10).unwrap().contains(&100));
    }

    #[test]
    fn test_unknown_echelon_is_rejected_before_writing() {
        let json = r#"{"units": [{"id": 1, "name": "Odd", "parent_id": null, "echelon": "regiment"}]}"#;
        let db = db();
        let err = Fixture::from_json(json).unwrap().import(&db).unwrap_err();

        assert!(matches!(
            err,
            AarError::Validation(ref v) if v.kind == ValidationErrorKind::Format
        ));
        assert!(OrgStore::new(&db).units().unwrap().is_empty());
    }

    #[test]
    fn test_parent_cycle_is_rejected() {
        let fixture = Fixture {
            units: vec![
                Unit::new(1, "A", Echelon::Platoon).with_parent(2),
                Unit::new(2, "B", Echelon::Platoon).with_parent(1),
            ],
            ..Fixture::default()
        };
        let err = fixture.validate().unwrap_err();
        assert!(matches!(
            err,
            AarError::Validation(ref v) if v.kind == ValidationErrorKind::Hierarchy
        ));
    }

    #[test]
    fn test_duplicate_aar_pair_is_rejected() {
        let fixture = Fixture {
            aars: vec![Aar::new(1, 7, 1, 3), Aar::new(2, 7, 1, 3)],
            ..Fixture::default()
        };
        assert!(fixture.validate().is_err());
    }

    #[test]
    fn test_failed_import_leaves_database_untouched() {
        let db = db();
        // Dangling event for the participant row violates the foreign key
        let mut fixture = Fixture::from_json(FIXTURE).unwrap();
        fixture.participants.push(Participation {
            event_id: 999,
            user_id: 10,
        });

        assert!(fixture.import(&db).is_err());
        assert!(OrgStore::new(&db).units().unwrap().is_empty());
    }
}
