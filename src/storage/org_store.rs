use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use super::Database;
use super::directory::OrgDirectory;
use crate::constants::access::REFERRAL_CODE_LEN;
use crate::types::{
    Aar, AarError, AarId, AarItem, AssignmentKind, Bucket, Echelon, EventId, ParseWithDefault,
    Result, ResultExt, Role, TrainingEvent, Unit, UnitAssignment, UnitId, User, UserId,
    ValidationErrorKind, log_filter_warn,
};

/// No 0/O or 1/I so codes survive being read aloud.
const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERRAL_ATTEMPTS: usize = 5;

const UNIT_COLUMNS: &str = "id, name, parent_id, echelon, referral_code, is_deleted, deleted_at";
const USER_COLUMNS: &str = "id, username, role, unit_id, is_deleted";
const AAR_COLUMNS: &str =
    "id, event_id, unit_id, created_by, sustain_items, improve_items, action_items, is_deleted";

/// Row counts for `aarlens status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub units: usize,
    pub users: usize,
    pub events: usize,
    pub aars: usize,
}

// =============================================================================
// Row Mapping
// =============================================================================

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn row_to_unit(row: &Row<'_>) -> rusqlite::Result<Unit> {
    let echelon: String = row.get(3)?;
    let deleted_at: Option<String> = row.get(6)?;
    Ok(Unit {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        echelon: Echelon::parse_or_default(&echelon),
        referral_code: row.get(4)?,
        is_deleted: row.get(5)?,
        deleted_at: deleted_at.as_deref().and_then(parse_timestamp),
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(2)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role: Role::parse_or_default(&role),
        unit_id: row.get(3)?,
        is_deleted: row.get(4)?,
    })
}

/// Raw AAR row; bucket columns still JSON.
struct AarRow {
    id: AarId,
    event_id: EventId,
    unit_id: UnitId,
    created_by: UserId,
    sustain: String,
    improve: String,
    action: String,
    is_deleted: bool,
}

impl AarRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            event_id: row.get(1)?,
            unit_id: row.get(2)?,
            created_by: row.get(3)?,
            sustain: row.get(4)?,
            improve: row.get(5)?,
            action: row.get(6)?,
            is_deleted: row.get(7)?,
        })
    }

    fn into_aar(self) -> Result<Aar> {
        let decode = |json: &str, bucket: Bucket| -> Result<Vec<AarItem>> {
            serde_json::from_str(json)
                .with_context_fn(|| format!("Corrupted {} items for AAR {}", bucket, self.id))
        };

        Ok(Aar {
            id: self.id,
            event_id: self.event_id,
            unit_id: self.unit_id,
            created_by: self.created_by,
            sustain_items: decode(&self.sustain, Bucket::Sustain)?,
            improve_items: decode(&self.improve, Bucket::Improve)?,
            action_items: decode(&self.action, Bucket::Action)?,
            is_deleted: self.is_deleted,
        })
    }
}

fn bucket_column(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Sustain => "sustain_items",
        Bucket::Improve => "improve_items",
        Bucket::Action => "action_items",
    }
}

pub(crate) fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LEN)
        .filter_map(|_| REFERRAL_ALPHABET.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect()
}

// =============================================================================
// Connection-level writes (shared by single calls and fixture import)
// =============================================================================

pub(crate) fn insert_unit(conn: &Connection, unit: &Unit) -> Result<()> {
    conn.execute(
        "INSERT INTO units (id, name, parent_id, echelon, referral_code, is_deleted, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            unit.id,
            unit.name,
            unit.parent_id,
            unit.echelon.as_str(),
            unit.referral_code,
            unit.is_deleted,
            unit.deleted_at.map(|t| t.to_rfc3339()),
        ],
    )
    .with_context_fn(|| format!("Failed to insert unit {}", unit.id))?;
    Ok(())
}

pub(crate) fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, role, unit_id, is_deleted) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.username,
            user.role.as_str(),
            user.unit_id,
            user.is_deleted,
        ],
    )
    .with_context_fn(|| format!("Failed to insert user {}", user.id))?;
    Ok(())
}

pub(crate) fn upsert_assignment(conn: &Connection, assignment: &UnitAssignment) -> Result<()> {
    conn.execute(
        "INSERT INTO unit_assignments (user_id, unit_id, kind, assigned_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id, unit_id) DO UPDATE SET
            kind = excluded.kind,
            assigned_at = excluded.assigned_at",
        params![
            assignment.user_id,
            assignment.unit_id,
            assignment.kind.as_str(),
            assignment.assigned_at.to_rfc3339(),
        ],
    )?;

    if assignment.kind == AssignmentKind::Primary {
        // At most one primary per user; the old one becomes an attachment
        conn.execute(
            "UPDATE unit_assignments SET kind = 'attached'
             WHERE user_id = ?1 AND unit_id != ?2 AND kind = 'primary'",
            params![assignment.user_id, assignment.unit_id],
        )?;
        conn.execute(
            "UPDATE users SET unit_id = ?1 WHERE id = ?2",
            params![assignment.unit_id, assignment.user_id],
        )?;
    }
    Ok(())
}

pub(crate) fn insert_event(conn: &Connection, event: &TrainingEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO events (id, name, unit_id, starts_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            event.id,
            event.name,
            event.unit_id,
            event.starts_at.to_rfc3339()
        ],
    )
    .with_context_fn(|| format!("Failed to insert event {}", event.id))?;
    Ok(())
}

pub(crate) fn insert_participant(conn: &Connection, event_id: EventId, user_id: UserId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO event_participants (event_id, user_id) VALUES (?1, ?2)",
        params![event_id, user_id],
    )?;
    Ok(())
}

/// One AAR per (event, author), soft-deleted ones included.
fn ensure_first_aar(conn: &Connection, event_id: EventId, created_by: UserId) -> Result<()> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM aars WHERE event_id = ?1 AND created_by = ?2)",
        params![event_id, created_by],
        |row| row.get(0),
    )?;
    if taken {
        return Err(AarError::invalid(
            ValidationErrorKind::Duplicate,
            "created_by",
            format!(
                "user {} already submitted an AAR for event {}",
                created_by, event_id
            ),
        ));
    }
    Ok(())
}

pub(crate) fn insert_aar(conn: &Connection, aar: &Aar) -> Result<()> {
    ensure_first_aar(conn, aar.event_id, aar.created_by)?;

    conn.execute(
        "INSERT INTO aars (id, event_id, unit_id, created_by, sustain_items, improve_items, action_items, is_deleted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            aar.id,
            aar.event_id,
            aar.unit_id,
            aar.created_by,
            serde_json::to_string(&aar.sustain_items)?,
            serde_json::to_string(&aar.improve_items)?,
            serde_json::to_string(&aar.action_items)?,
            aar.is_deleted,
        ],
    )
    .with_context_fn(|| format!("Failed to insert AAR {}", aar.id))?;
    Ok(())
}

/// True when `target` is `start` or one of its ancestors.
fn chain_reaches(conn: &Connection, start: UnitId, target: UnitId) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT id, parent_id FROM units")?;
    let parents: HashMap<UnitId, Option<UnitId>> = stmt
        .query_map([], |row| {
            Ok((row.get::<_, UnitId>(0)?, row.get::<_, Option<UnitId>>(1)?))
        })?
        .filter_map(|r| log_filter_warn(r, "reading unit link"))
        .collect();

    let mut visited = HashSet::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if id == target {
            return Ok(true);
        }
        if !visited.insert(id) {
            warn!(unit_id = id, "Existing cycle in unit links");
            return Ok(true);
        }
        current = parents.get(&id).copied().flatten();
    }
    Ok(false)
}

fn live_unit_exists(conn: &Connection, unit_id: UnitId) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM units WHERE id = ?1 AND is_deleted = 0)",
        params![unit_id],
        |row| row.get(0),
    )?)
}

// =============================================================================
// OrgStore
// =============================================================================

/// Typed access to organization data in a [`Database`].
pub struct OrgStore<'a> {
    db: &'a Database,
}

impl<'a> OrgStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ---- Units -------------------------------------------------------------

    /// Create a live unit with a fresh referral code.
    pub fn create_unit(
        &self,
        name: &str,
        echelon: Echelon,
        parent_id: Option<UnitId>,
    ) -> Result<Unit> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AarError::invalid(
                ValidationErrorKind::MissingField,
                "name",
                "unit name must not be empty",
            ));
        }
        if echelon == Echelon::Unknown {
            return Err(AarError::invalid(
                ValidationErrorKind::Format,
                "echelon",
                "echelon must be team, squad, platoon, company or battalion",
            ));
        }

        let conn = self.db.connection()?;
        if let Some(parent) = parent_id
            && !live_unit_exists(&conn, parent)?
        {
            return Err(AarError::not_found("unit", parent));
        }

        for _ in 0..REFERRAL_ATTEMPTS {
            let code = generate_referral_code();
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM units WHERE referral_code = ?1)",
                params![code],
                |row| row.get(0),
            )?;
            if taken {
                debug!(code = %code, "Referral code collision, retrying");
                continue;
            }

            conn.execute(
                "INSERT INTO units (name, parent_id, echelon, referral_code) VALUES (?1, ?2, ?3, ?4)",
                params![name, parent_id, echelon.as_str(), code],
            )
            .with_context("Failed to create unit")?;

            let mut unit = Unit::new(conn.last_insert_rowid(), name, echelon).with_referral_code(code);
            unit.parent_id = parent_id;
            info!(unit_id = unit.id, name = %unit.name, echelon = %echelon, "Created unit");
            return Ok(unit);
        }

        Err(AarError::Storage(
            "Could not generate a unique referral code".to_string(),
        ))
    }

    pub fn unit(&self, id: UnitId) -> Result<Option<Unit>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {} FROM units WHERE id = ?1", UNIT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], row_to_unit).optional()?)
    }

    pub fn units(&self) -> Result<Vec<Unit>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM units ORDER BY id", UNIT_COLUMNS))?;
        let units = stmt
            .query_map([], row_to_unit)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to load units")?;
        Ok(units)
    }

    /// Re-parent a unit. `None` makes it a root.
    ///
    /// Rejects self-parenting and any parent inside the unit's own subtree.
    pub fn set_unit_parent(&self, unit_id: UnitId, parent_id: Option<UnitId>) -> Result<()> {
        if parent_id == Some(unit_id) {
            return Err(AarError::invalid(
                ValidationErrorKind::Hierarchy,
                "parent_id",
                "unit cannot be its own parent",
            ));
        }

        self.db.transaction(move |conn| {
            if !live_unit_exists(conn, unit_id)? {
                return Err(AarError::not_found("unit", unit_id));
            }
            if let Some(parent) = parent_id {
                if !live_unit_exists(conn, parent)? {
                    return Err(AarError::not_found("unit", parent));
                }
                if chain_reaches(conn, parent, unit_id)? {
                    return Err(AarError::invalid(
                        ValidationErrorKind::Hierarchy,
                        "parent_id",
                        format!("unit {} is a descendant of unit {}", parent, unit_id),
                    ));
                }
            }

            conn.execute(
                "UPDATE units SET parent_id = ?1 WHERE id = ?2",
                params![parent_id, unit_id],
            )?;
            Ok(())
        })?;

        info!(unit_id, parent_id = ?parent_id, "Re-parented unit");
        Ok(())
    }

    pub fn soft_delete_unit(&self, unit_id: UnitId) -> Result<()> {
        let affected = self.db.execute(
            "UPDATE units SET is_deleted = 1, deleted_at = ?1 WHERE id = ?2 AND is_deleted = 0",
            &[&Utc::now().to_rfc3339(), &unit_id],
        )?;
        if affected == 0 {
            return Err(AarError::not_found("unit", unit_id));
        }
        info!(unit_id, "Soft-deleted unit");
        Ok(())
    }

    /// Remove a unit for good. Children become roots and members lose
    /// their primary unit.
    pub fn purge_unit(&self, unit_id: UnitId) -> Result<()> {
        self.db.transaction(move |conn| {
            let removed = conn.execute("DELETE FROM units WHERE id = ?1", params![unit_id])?;
            if removed == 0 {
                return Err(AarError::not_found("unit", unit_id));
            }
            conn.execute(
                "UPDATE units SET parent_id = NULL WHERE parent_id = ?1",
                params![unit_id],
            )?;
            conn.execute(
                "DELETE FROM unit_assignments WHERE unit_id = ?1",
                params![unit_id],
            )?;
            conn.execute(
                "UPDATE users SET unit_id = NULL WHERE unit_id = ?1",
                params![unit_id],
            )?;
            Ok(())
        })?;

        info!(unit_id, "Purged unit");
        Ok(())
    }

    /// Live unit with the given referral code (case-insensitive).
    pub fn find_unit_by_referral(&self, code: &str) -> Result<Option<Unit>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {} FROM units WHERE referral_code = ?1 AND is_deleted = 0",
            UNIT_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![code.trim().to_uppercase()], row_to_unit)
            .optional()?)
    }

    // ---- Users -------------------------------------------------------------

    pub fn create_user(&self, username: &str, role: Role) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AarError::invalid(
                ValidationErrorKind::MissingField,
                "username",
                "username must not be empty",
            ));
        }
        if role == Role::Unknown {
            return Err(AarError::invalid(
                ValidationErrorKind::Format,
                "role",
                "unknown role",
            ));
        }
        if self.user_by_username(username)?.is_some() {
            return Err(AarError::invalid(
                ValidationErrorKind::Duplicate,
                "username",
                format!("username '{}' is taken", username),
            ));
        }

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO users (username, role) VALUES (?1, ?2)",
            params![username, role.as_str()],
        )
        .with_context("Failed to create user")?;

        let user = User::new(conn.last_insert_rowid(), username, role);
        info!(user_id = user.id, role = %role, "Created user");
        Ok(user)
    }

    pub fn user(&self, id: UserId) -> Result<Option<User>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        Ok(conn.query_row(&sql, params![id], row_to_user).optional()?)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        Ok(conn
            .query_row(&sql, params![username], row_to_user)
            .optional()?)
    }

    pub fn users(&self) -> Result<Vec<User>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to load users")?;
        Ok(users)
    }

    pub fn soft_delete_user(&self, user_id: UserId) -> Result<()> {
        let affected = self.db.execute(
            "UPDATE users SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
            &[&user_id],
        )?;
        if affected == 0 {
            return Err(AarError::not_found("user", user_id));
        }
        info!(user_id, "Soft-deleted user");
        Ok(())
    }

    /// Attach a user to a unit. A primary assignment also becomes the
    /// user's canonical `unit_id`.
    pub fn assign_user(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        kind: AssignmentKind,
    ) -> Result<UnitAssignment> {
        let assignment = UnitAssignment {
            user_id,
            unit_id,
            kind,
            assigned_at: Utc::now(),
        };
        let row = assignment.clone();

        self.db.transaction(move |conn| {
            let user_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1 AND is_deleted = 0)",
                params![row.user_id],
                |r| r.get(0),
            )?;
            if !user_exists {
                return Err(AarError::not_found("user", row.user_id));
            }
            if !live_unit_exists(conn, row.unit_id)? {
                return Err(AarError::not_found("unit", row.unit_id));
            }
            upsert_assignment(conn, &row)
        })?;

        info!(user_id, unit_id, kind = kind.as_str(), "Assigned user");
        Ok(assignment)
    }

    pub fn assignments(&self, user_id: UserId) -> Result<Vec<UnitAssignment>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, unit_id, kind, assigned_at FROM unit_assignments
             WHERE user_id = ?1 ORDER BY unit_id",
        )?;

        let assignments = stmt
            .query_map(params![user_id], |row| {
                let kind: String = row.get(2)?;
                let assigned_at: String = row.get(3)?;
                Ok(UnitAssignment {
                    user_id: row.get(0)?,
                    unit_id: row.get(1)?,
                    kind: AssignmentKind::parse_or_default(&kind),
                    assigned_at: parse_timestamp(&assigned_at).unwrap_or_else(Utc::now),
                })
            })?
            .filter_map(|r| log_filter_warn(r, "loading assignment"))
            .collect();

        Ok(assignments)
    }

    // ---- Events ------------------------------------------------------------

    pub fn create_event(
        &self,
        name: &str,
        unit_id: UnitId,
        starts_at: DateTime<Utc>,
    ) -> Result<TrainingEvent> {
        let conn = self.db.connection()?;
        if !live_unit_exists(&conn, unit_id)? {
            return Err(AarError::not_found("unit", unit_id));
        }

        conn.execute(
            "INSERT INTO events (name, unit_id, starts_at) VALUES (?1, ?2, ?3)",
            params![name, unit_id, starts_at.to_rfc3339()],
        )
        .with_context("Failed to create event")?;

        Ok(TrainingEvent {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            unit_id,
            starts_at,
        })
    }

    pub fn events(&self) -> Result<Vec<TrainingEvent>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare("SELECT id, name, unit_id, starts_at FROM events ORDER BY id")?;

        let events = stmt
            .query_map([], |row| {
                let starts_at: String = row.get(3)?;
                Ok(TrainingEvent {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    unit_id: row.get(2)?,
                    starts_at: parse_timestamp(&starts_at).unwrap_or_else(Utc::now),
                })
            })?
            .filter_map(|r| log_filter_warn(r, "loading event"))
            .collect();

        Ok(events)
    }

    pub fn add_participant(&self, event_id: EventId, user_id: UserId) -> Result<()> {
        let conn = self.db.connection()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
            params![event_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AarError::not_found("event", event_id));
        }
        insert_participant(&conn, event_id, user_id)
    }

    pub fn participated_event_ids(&self, user_id: UserId) -> Result<HashSet<EventId>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare("SELECT event_id FROM event_participants WHERE user_id = ?1")?;

        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<EventId>, _>>()
            .with_context("Failed to load participation")?;
        Ok(ids)
    }

    // ---- AARs --------------------------------------------------------------

    /// Open an empty AAR. One per (event, author).
    pub fn create_aar(&self, event_id: EventId, unit_id: UnitId, created_by: UserId) -> Result<Aar> {
        let id = self.db.transaction(move |conn| {
            let event_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
                params![event_id],
                |row| row.get(0),
            )?;
            if !event_exists {
                return Err(AarError::not_found("event", event_id));
            }

            ensure_first_aar(conn, event_id, created_by)?;

            conn.execute(
                "INSERT INTO aars (event_id, unit_id, created_by) VALUES (?1, ?2, ?3)",
                params![event_id, unit_id, created_by],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(aar_id = id, event_id, created_by, "Created AAR");
        Ok(Aar::new(id, event_id, unit_id, created_by))
    }

    pub fn aar(&self, id: AarId) -> Result<Option<Aar>> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT {} FROM aars WHERE id = ?1", AAR_COLUMNS);
        conn.query_row(&sql, params![id], AarRow::from_row)
            .optional()?
            .map(AarRow::into_aar)
            .transpose()
    }

    pub fn aars(&self) -> Result<Vec<Aar>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM aars ORDER BY id", AAR_COLUMNS))?;
        let rows = stmt
            .query_map([], AarRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to load AARs")?;

        rows.into_iter().map(AarRow::into_aar).collect()
    }

    /// Swap one bucket's item list wholesale.
    pub fn replace_aar_items(&self, aar_id: AarId, bucket: Bucket, items: &[AarItem]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        let sql = format!(
            "UPDATE aars SET {} = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2 AND is_deleted = 0",
            bucket_column(bucket)
        );

        let affected = self.db.execute(&sql, &[&json, &aar_id])?;
        if affected == 0 {
            return Err(AarError::not_found("aar", aar_id));
        }
        debug!(aar_id, bucket = %bucket, items = items.len(), "Replaced AAR items");
        Ok(())
    }

    pub fn soft_delete_aar(&self, aar_id: AarId) -> Result<()> {
        let affected = self.db.execute(
            "UPDATE aars SET is_deleted = 1, updated_at = CURRENT_TIMESTAMP WHERE id = ?1 AND is_deleted = 0",
            &[&aar_id],
        )?;
        if affected == 0 {
            return Err(AarError::not_found("aar", aar_id));
        }
        info!(aar_id, "Soft-deleted AAR");
        Ok(())
    }

    // ---- Status ------------------------------------------------------------

    /// Live row counts.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.db.connection()?;
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            units: count("SELECT COUNT(*) FROM units WHERE is_deleted = 0")?,
            users: count("SELECT COUNT(*) FROM users WHERE is_deleted = 0")?,
            events: count("SELECT COUNT(*) FROM events")?,
            aars: count("SELECT COUNT(*) FROM aars WHERE is_deleted = 0")?,
        })
    }
}

impl OrgDirectory for Database {
    fn units(&self) -> Result<Vec<Unit>> {
        OrgStore::new(self).units()
    }

    fn users(&self) -> Result<Vec<User>> {
        OrgStore::new(self).users()
    }

    fn user(&self, id: UserId) -> Result<Option<User>> {
        OrgStore::new(self).user(id)
    }

    fn aars(&self) -> Result<Vec<Aar>> {
        OrgStore::new(self).aars()
    }

    fn participated_event_ids(&self, user_id: UserId) -> Result<HashSet<EventId>> {
        OrgStore::new(self).participated_event_ids(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to open database");
        db.initialize().expect("Failed to initialize");
        db
    }

    #[test]
    fn test_create_unit_assigns_referral_code() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let company = store.create_unit("Alpha Company", Echelon::Company, None).unwrap();
        assert_eq!(company.referral_code.len(), REFERRAL_CODE_LEN);
        assert!(company.referral_code.bytes().all(|b| REFERRAL_ALPHABET.contains(&b)));

        let found = store
            .find_unit_by_referral(&company.referral_code.to_lowercase())
            .unwrap()
            .expect("unit should be found by code");
        assert_eq!(found.id, company.id);
    }

    #[test]
    fn test_create_unit_rejects_blank_name_and_missing_parent() {
        let db = store_db();
        let store = OrgStore::new(&db);

        assert!(matches!(
            store.create_unit("  ", Echelon::Squad, None),
            Err(AarError::Validation(_))
        ));
        assert!(
            store
                .create_unit("1st Squad", Echelon::Squad, Some(99))
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_set_parent_rejects_self_and_cycles() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let company = store.create_unit("Alpha", Echelon::Company, None).unwrap();
        let platoon = store
            .create_unit("1st Platoon", Echelon::Platoon, Some(company.id))
            .unwrap();
        let squad = store
            .create_unit("1st Squad", Echelon::Squad, Some(platoon.id))
            .unwrap();

        let self_parent = store.set_unit_parent(company.id, Some(company.id));
        assert!(matches!(
            self_parent,
            Err(AarError::Validation(ref v)) if v.kind == ValidationErrorKind::Hierarchy
        ));

        let cycle = store.set_unit_parent(company.id, Some(squad.id));
        assert!(matches!(
            cycle,
            Err(AarError::Validation(ref v)) if v.kind == ValidationErrorKind::Hierarchy
        ));

        store.set_unit_parent(squad.id, None).unwrap();
        assert_eq!(store.unit(squad.id).unwrap().unwrap().parent_id, None);
    }

    #[test]
    fn test_soft_delete_hides_from_referral_lookup() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let unit = store.create_unit("Alpha", Echelon::Company, None).unwrap();
        store.soft_delete_unit(unit.id).unwrap();

        let stored = store.unit(unit.id).unwrap().unwrap();
        assert!(stored.is_deleted);
        assert!(stored.deleted_at.is_some());
        assert!(store.find_unit_by_referral(&unit.referral_code).unwrap().is_none());
        assert!(store.soft_delete_unit(unit.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_purge_unit_orphans_children_and_members() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let company = store.create_unit("Alpha", Echelon::Company, None).unwrap();
        let platoon = store
            .create_unit("1st Platoon", Echelon::Platoon, Some(company.id))
            .unwrap();
        let user = store.create_user("cpt.price", Role::CompanyCommander).unwrap();
        store
            .assign_user(user.id, company.id, AssignmentKind::Primary)
            .unwrap();

        store.purge_unit(company.id).unwrap();

        assert!(store.unit(company.id).unwrap().is_none());
        assert_eq!(store.unit(platoon.id).unwrap().unwrap().parent_id, None);
        assert_eq!(store.user(user.id).unwrap().unwrap().unit_id, None);
        assert!(store.assignments(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_primary_assignment_rewrites_user_unit() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let first = store.create_unit("1st Squad", Echelon::Squad, None).unwrap();
        let second = store.create_unit("2nd Squad", Echelon::Squad, None).unwrap();
        let user = store.create_user("sgt.rock", Role::SquadLeader).unwrap();

        store.assign_user(user.id, first.id, AssignmentKind::Primary).unwrap();
        store.assign_user(user.id, second.id, AssignmentKind::Attached).unwrap();
        assert_eq!(store.user(user.id).unwrap().unwrap().unit_id, Some(first.id));

        store.assign_user(user.id, second.id, AssignmentKind::Primary).unwrap();
        assert_eq!(store.user(user.id).unwrap().unwrap().unit_id, Some(second.id));

        let kinds: Vec<(UnitId, AssignmentKind)> = store
            .assignments(user.id)
            .unwrap()
            .into_iter()
            .map(|a| (a.unit_id, a.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (first.id, AssignmentKind::Attached),
                (second.id, AssignmentKind::Primary)
            ]
        );
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = store_db();
        let store = OrgStore::new(&db);

        store.create_user("pvt.snuffy", Role::Soldier).unwrap();
        let dup = store.create_user("pvt.snuffy", Role::Soldier);
        assert!(matches!(
            dup,
            Err(AarError::Validation(ref v)) if v.kind == ValidationErrorKind::Duplicate
        ));
    }

    #[test]
    fn test_one_aar_per_event_and_author() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let unit = store.create_unit("1st Squad", Echelon::Squad, None).unwrap();
        let user = store.create_user("sgt.rock", Role::SquadLeader).unwrap();
        let event = store.create_event("Squad STX", unit.id, Utc::now()).unwrap();

        store.create_aar(event.id, unit.id, user.id).unwrap();
        let dup = store.create_aar(event.id, unit.id, user.id);
        assert!(matches!(
            dup,
            Err(AarError::Validation(ref v)) if v.kind == ValidationErrorKind::Duplicate
        ));

        assert!(store.create_aar(999, unit.id, user.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_replace_items_and_soft_delete_aar() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let unit = store.create_unit("1st Squad", Echelon::Squad, None).unwrap();
        let user = store.create_user("sgt.rock", Role::SquadLeader).unwrap();
        let event = store.create_event("Squad STX", unit.id, Utc::now()).unwrap();
        let aar = store.create_aar(event.id, unit.id, user.id).unwrap();

        let items = vec![AarItem::new("Radio checks were late.", user.id, unit.id, Echelon::Squad)];
        store.replace_aar_items(aar.id, Bucket::Improve, &items).unwrap();

        let stored = store.aar(aar.id).unwrap().unwrap();
        assert_eq!(stored.improve_items, items);
        assert!(stored.sustain_items.is_empty());

        store.soft_delete_aar(aar.id).unwrap();
        assert!(store.aar(aar.id).unwrap().unwrap().is_deleted);
        assert!(
            store
                .replace_aar_items(aar.id, Bucket::Sustain, &items)
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_participation_and_directory_reads() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let unit = store.create_unit("1st Squad", Echelon::Squad, None).unwrap();
        let user = store.create_user("pvt.snuffy", Role::Soldier).unwrap();
        let event = store.create_event("Range day", unit.id, Utc::now()).unwrap();
        store.add_participant(event.id, user.id).unwrap();
        store.add_participant(event.id, user.id).unwrap();

        let directory: &dyn OrgDirectory = &db;
        assert_eq!(
            directory.participated_event_ids(user.id).unwrap(),
            HashSet::from([event.id])
        );
        assert_eq!(directory.units().unwrap().len(), 1);
        assert!(store.add_participant(999, user.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_stored_enums_fall_back() {
        let db = store_db();
        db.execute(
            "INSERT INTO units (id, name, echelon, referral_code) VALUES (1, 'Odd', 'regiment', 'X')",
            &[],
        )
        .unwrap();
        db.execute(
            "INSERT INTO users (id, username, role) VALUES (1, 'who', 'Chaplain')",
            &[],
        )
        .unwrap();

        let store = OrgStore::new(&db);
        assert_eq!(store.unit(1).unwrap().unwrap().echelon, Echelon::Unknown);
        assert_eq!(store.user(1).unwrap().unwrap().role, Role::Unknown);
    }

    #[test]
    fn test_corrupted_items_surface_as_error() {
        let db = store_db();
        db.execute(
            "INSERT INTO aars (id, event_id, unit_id, created_by, sustain_items) VALUES (1, 1, 1, 1, 'not json')",
            &[],
        )
        .unwrap();

        let err = OrgStore::new(&db).aars().unwrap_err();
        assert!(err.to_string().contains("Corrupted sustain items for AAR 1"));
    }

    #[test]
    fn test_stats_count_live_rows() {
        let db = store_db();
        let store = OrgStore::new(&db);

        let a = store.create_unit("A", Echelon::Company, None).unwrap();
        store.create_unit("B", Echelon::Company, None).unwrap();
        store.soft_delete_unit(a.id).unwrap();
        store.create_user("u", Role::Soldier).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.units, 1);
        assert_eq!(stats.users, 1);
        assert_eq!(stats.aars, 0);
    }
}
