//! Hierarchy Policy
//!
//! Static `Role → Set<Echelon>` table. Read-only once built.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::config::HierarchyConfig;
use crate::types::{Echelon, ParseWithDefault, Role};

#[derive(Debug, Clone)]
pub struct HierarchyPolicy {
    table: HashMap<Role, HashSet<Echelon>>,
}

impl Default for HierarchyPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl HierarchyPolicy {
    /// Policy with no entries; every role is a policy gap.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Built-in rank table. Each role sees its home echelon and everything below.
    pub fn builtin() -> Self {
        let entries: [(Role, Option<Echelon>); 10] = [
            (Role::Soldier, None),
            (Role::TeamLeader, Some(Echelon::Team)),
            (Role::SquadLeader, Some(Echelon::Squad)),
            (Role::PlatoonSergeant, Some(Echelon::Platoon)),
            (Role::PlatoonLeader, Some(Echelon::Platoon)),
            (Role::FirstSergeant, Some(Echelon::Company)),
            (Role::CompanyCommander, Some(Echelon::Company)),
            (Role::BattalionCommander, Some(Echelon::Battalion)),
            (Role::Commander, Some(Echelon::Battalion)),
            (Role::Admin, Some(Echelon::Battalion)),
        ];

        let table = entries
            .into_iter()
            .map(|(role, top)| {
                let echelons = top.map(Echelon::and_below).unwrap_or_default();
                (role, echelons.into_iter().collect())
            })
            .collect();

        Self { table }
    }

    /// Built-in table with per-role replacements from configuration.
    /// Unknown role names are skipped with a warning.
    pub fn from_config(config: &HierarchyConfig) -> Self {
        let mut policy = Self::builtin();
        for (name, echelons) in &config.policy {
            match Role::try_parse(name) {
                Some(role) => policy = policy.with_role(role, echelons.iter().copied()),
                None => warn!(role = %name, "Ignoring policy override for unknown role"),
            }
        }
        policy
    }

    /// Replace the echelon set of one role. `Unknown` is never stored.
    pub fn with_role(mut self, role: Role, echelons: impl IntoIterator<Item = Echelon>) -> Self {
        let set = echelons
            .into_iter()
            .filter(|e| *e != Echelon::Unknown)
            .collect();
        self.table.insert(role, set);
        self
    }

    /// Drop a role entirely, leaving a policy gap.
    pub fn without_role(mut self, role: Role) -> Self {
        self.table.remove(&role);
        self
    }

    /// Echelons `role` may inspect. A missing entry is a configuration gap:
    /// logged and treated as no access.
    pub fn accessible_echelons(&self, role: Role) -> HashSet<Echelon> {
        match self.table.get(&role) {
            Some(set) => set.clone(),
            None => {
                warn!(%role, "No hierarchy policy entry for role; denying cross-unit access");
                HashSet::new()
            }
        }
    }

    /// Per-decision check. Silent on policy gaps; callers scanning many
    /// units report a gap once through [`accessible_echelons`](Self::accessible_echelons).
    pub fn allows(&self, role: Role, echelon: Echelon) -> bool {
        self.table
            .get(&role)
            .is_some_and(|set| set.contains(&echelon))
    }

    pub fn has_entry(&self, role: Role) -> bool {
        self.table.contains_key(&role)
    }
}
