//! Unit Tree
//!
//! Read-only forest of organizational units built from a directory snapshot.
//! Parent links are resolved by id; soft-deleted units are left out.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use crate::types::{Echelon, Unit, UnitId};

#[derive(Debug, Clone, Default)]
pub struct UnitTree {
    units: HashMap<UnitId, Unit>,
    children: HashMap<UnitId, Vec<UnitId>>,
}

impl UnitTree {
    pub fn new(units: impl IntoIterator<Item = Unit>) -> Self {
        let units: HashMap<UnitId, Unit> = units
            .into_iter()
            .filter(|u| !u.is_deleted)
            .map(|u| (u.id, u))
            .collect();

        let mut children: HashMap<UnitId, Vec<UnitId>> = HashMap::new();
        for unit in units.values() {
            if let Some(parent_id) = unit.parent_id
                && parent_id != unit.id
            {
                children.entry(parent_id).or_default().push(unit.id);
            }
        }
        for ids in children.values_mut() {
            ids.sort_unstable();
        }

        Self { units, children }
    }

    pub fn get_unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Direct children, ordered by id.
    pub fn get_children(&self, id: UnitId) -> Vec<&Unit> {
        self.children
            .get(&id)
            .map(|ids| ids.iter().filter_map(|c| self.units.get(c)).collect())
            .unwrap_or_default()
    }

    /// Every unit below `id` in breadth-first order, excluding `id` itself.
    /// Guarded by a visited set so a corrupted parent graph cannot loop.
    pub fn descendants(&self, id: UnitId) -> Vec<&Unit> {
        let mut visited: HashSet<UnitId> = HashSet::from([id]);
        let mut queue: VecDeque<UnitId> = VecDeque::from([id]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in self.get_children(current) {
                if !visited.insert(child.id) {
                    warn!(unit_id = child.id, "Cycle detected while expanding subtree");
                    continue;
                }
                out.push(child);
                queue.push_back(child.id);
            }
        }

        out
    }

    /// `id` followed by its descendants. Empty if `id` is not in the tree.
    pub fn subtree(&self, id: UnitId) -> Vec<&Unit> {
        match self.get_unit(id) {
            Some(root) => std::iter::once(root).chain(self.descendants(id)).collect(),
            None => Vec::new(),
        }
    }

    /// All units ordered by id.
    pub fn units(&self) -> Vec<&Unit> {
        let mut all: Vec<&Unit> = self.units.values().collect();
        all.sort_by_key(|u| u.id);
        all
    }

    /// Units without a (resolvable) parent.
    pub fn roots(&self) -> Vec<&Unit> {
        self.units()
            .into_iter()
            .filter(|u| u.parent_id.is_none_or(|p| !self.units.contains_key(&p)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn echelon_rank(echelon: Echelon) -> u8 {
        echelon.rank()
    }
}
