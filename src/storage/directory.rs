//! Organization data-access seam.
//!
//! The core reads units, users, AARs and event participation through
//! `OrgDirectory`. Each call is treated as a fresh snapshot; the core never
//! writes through it.

use std::collections::{HashMap, HashSet};

use crate::types::{Aar, EventId, Result, Unit, User, UserId};

pub trait OrgDirectory: Send + Sync {
    /// All units, including soft-deleted ones.
    fn units(&self) -> Result<Vec<Unit>>;

    /// All users, including soft-deleted ones.
    fn users(&self) -> Result<Vec<User>>;

    fn user(&self, id: UserId) -> Result<Option<User>>;

    /// All AARs, including soft-deleted ones.
    fn aars(&self) -> Result<Vec<Aar>>;

    /// Events the user took part in.
    fn participated_event_ids(&self, user_id: UserId) -> Result<HashSet<EventId>>;
}

/// In-memory directory for fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    pub units: Vec<Unit>,
    pub users: Vec<User>,
    pub aars: Vec<Aar>,
    pub participation: HashMap<UserId, HashSet<EventId>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.units.extend(units);
        self
    }

    pub fn with_users(mut self, users: impl IntoIterator<Item = User>) -> Self {
        self.users.extend(users);
        self
    }

    pub fn with_aars(mut self, aars: impl IntoIterator<Item = Aar>) -> Self {
        self.aars.extend(aars);
        self
    }

    pub fn with_participant(mut self, user_id: UserId, event_id: EventId) -> Self {
        self.participation
            .entry(user_id)
            .or_default()
            .insert(event_id);
        self
    }
}

impl OrgDirectory for MemoryDirectory {
    fn units(&self) -> Result<Vec<Unit>> {
        Ok(self.units.clone())
    }

    fn users(&self) -> Result<Vec<User>> {
        Ok(self.users.clone())
    }

    fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    fn aars(&self) -> Result<Vec<Aar>> {
        Ok(self.aars.clone())
    }

    fn participated_event_ids(&self, user_id: UserId) -> Result<HashSet<EventId>> {
        Ok(self.participation.get(&user_id).cloned().unwrap_or_default())
    }
}
