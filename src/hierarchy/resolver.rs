//! Access Resolver
//!
//! Decides whether a user may see a unit. Every failure path denies:
//! missing units, policy gaps, malformed echelons and parent cycles all
//! return `false` rather than an error. Missing home units and cycles are
//! logged as warnings; callers scanning many units report policy gaps once.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::policy::HierarchyPolicy;
use super::tree::UnitTree;
use crate::constants::access::{DEFAULT_SYSTEM_ADMIN_USERNAME, LATERAL_PEER_CEILING};
use crate::types::{Role, Unit, UnitId, User};

pub struct AccessResolver<'a> {
    tree: &'a UnitTree,
    policy: &'a HierarchyPolicy,
    admin_username: &'a str,
}

impl<'a> AccessResolver<'a> {
    pub fn new(tree: &'a UnitTree, policy: &'a HierarchyPolicy) -> Self {
        Self {
            tree,
            policy,
            admin_username: DEFAULT_SYSTEM_ADMIN_USERNAME,
        }
    }

    pub fn with_admin_username(mut self, username: &'a str) -> Self {
        self.admin_username = username;
        self
    }

    pub fn tree(&self) -> &UnitTree {
        self.tree
    }

    /// The reserved system administrator: Admin role AND the reserved
    /// username. Commanders who registered a unit hold Admin too but are
    /// not this identity.
    pub fn is_system_admin(&self, user: &User) -> bool {
        user.role == Role::Admin && user.username == self.admin_username
    }

    pub fn can_access_unit(&self, user: &User, target: &Unit) -> bool {
        if self.is_system_admin(user) {
            return true;
        }

        if user.unit_id == Some(target.id) {
            return true;
        }

        let Some(source) = user.unit_id.and_then(|id| self.tree.get_unit(id)) else {
            warn!(
                user_id = user.id,
                unit_id = ?user.unit_id,
                "User's home unit not found; denying access"
            );
            return false;
        };

        if !self.policy.allows(user.role, target.echelon) {
            debug!(
                user_id = user.id,
                role = %user.role,
                echelon = %target.echelon,
                "Echelon outside role policy"
            );
            return false;
        }

        self.in_chain_of_command(source, target)
    }

    /// Upward walk from `target` looking for `source`, a direct parent link
    /// to it, or the source's own parent when that parent is a lateral-peer
    /// parent. A target ranked above the source ends the walk: subordinates
    /// cannot supervise.
    pub fn in_chain_of_command(&self, source: &Unit, target: &Unit) -> bool {
        let source_rank = source.echelon.rank();
        let mut visited: HashSet<UnitId> = HashSet::new();
        let mut current = target;

        loop {
            if !visited.insert(current.id) {
                warn!(
                    source = source.id,
                    target = target.id,
                    at = current.id,
                    "Cycle detected in unit hierarchy; denying access"
                );
                return false;
            }

            if current.id == source.id {
                return true;
            }

            if source_rank < current.echelon.rank() {
                return false;
            }

            let Some(parent_id) = current.parent_id else {
                return false;
            };

            if parent_id == source.id {
                return true;
            }

            if source.parent_id == Some(parent_id) && self.is_peer_parent(source, parent_id) {
                return true;
            }

            match self.tree.get_unit(parent_id) {
                Some(parent) => current = parent,
                None => {
                    debug!(unit_id = current.id, parent_id, "Dangling parent reference");
                    return false;
                }
            }
        }
    }

    /// Siblings of `source` are peers only under a parent exactly one echelon
    /// up and no higher than [`LATERAL_PEER_CEILING`]: squads share a platoon,
    /// platoons share a company, companies under a battalion do not.
    fn is_peer_parent(&self, source: &Unit, parent_id: UnitId) -> bool {
        self.tree.get_unit(parent_id).is_some_and(|parent| {
            let rank = parent.echelon.rank();
            rank == source.echelon.rank() + 1 && rank <= LATERAL_PEER_CEILING.rank()
        })
    }

    /// Units a commander of `home` may list: the home unit and its whole
    /// descendant subtree. The echelon policy plays no part.
    pub fn commander_scope<'t>(tree: &'t UnitTree, home: &Unit) -> Vec<&'t Unit> {
        tree.subtree(home.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Echelon;
    use proptest::prelude::*;

    //  1 Battalion
    //  ├── 2 Alpha Company
    //  │   ├── 3 1st Platoon
    //  │   │   ├── 4 1st Squad ── 6 Team A
    //  │   │   └── 5 2nd Squad ── 7 Team B
    //  │   └── 8 2nd Platoon ── 10 3rd Squad
    //  └── 9 Bravo Company
    //  11 Unrelated Company (separate tree)
    fn sample_tree() -> UnitTree {
        UnitTree::new(vec![
            Unit::new(1, "1st Battalion", Echelon::Battalion),
            Unit::new(2, "Alpha Company", Echelon::Company).with_parent(1),
            Unit::new(3, "1st Platoon", Echelon::Platoon).with_parent(2),
            Unit::new(4, "1st Squad", Echelon::Squad).with_parent(3),
            Unit::new(5, "2nd Squad", Echelon::Squad).with_parent(3),
            Unit::new(6, "Team A", Echelon::Team).with_parent(4),
            Unit::new(7, "Team B", Echelon::Team).with_parent(5),
            Unit::new(8, "2nd Platoon", Echelon::Platoon).with_parent(2),
            Unit::new(9, "Bravo Company", Echelon::Company).with_parent(1),
            Unit::new(10, "3rd Squad", Echelon::Squad).with_parent(8),
            Unit::new(11, "Unrelated Company", Echelon::Company),
        ])
    }

    fn user(role: Role, unit: UnitId) -> User {
        User::new(100, "jdoe", role).with_unit(unit)
    }

    fn can(tree: &UnitTree, user: &User, target: UnitId) -> bool {
        let policy = HierarchyPolicy::builtin();
        let resolver = AccessResolver::new(tree, &policy);
        resolver.can_access_unit(user, tree.get_unit(target).unwrap())
    }

    #[test]
    fn test_squad_leader_sees_sibling_squad_not_unrelated_company() {
        let tree = sample_tree();
        let leader = user(Role::SquadLeader, 4);

        assert!(can(&tree, &leader, 5));
        assert!(can(&tree, &leader, 6));
        assert!(!can(&tree, &leader, 11));
    }

    #[test]
    fn test_squad_leader_cannot_see_squad_in_other_platoon() {
        let tree = sample_tree();
        assert!(!can(&tree, &user(Role::SquadLeader, 4), 10));
    }

    #[test]
    fn test_squad_leader_cannot_see_own_platoon() {
        let tree = sample_tree();
        assert!(!can(&tree, &user(Role::SquadLeader, 4), 3));
    }

    #[test]
    fn test_company_commander_sees_down_not_across_battalion() {
        let tree = sample_tree();
        let co = user(Role::CompanyCommander, 2);

        for id in [3, 4, 5, 6, 7, 8, 10] {
            assert!(can(&tree, &co, id), "expected access to {}", id);
        }
        assert!(!can(&tree, &co, 1));
        assert!(!can(&tree, &co, 11));
    }

    #[test]
    fn test_soldier_sees_only_home_unit() {
        let tree = sample_tree();
        let soldier = user(Role::Soldier, 6);

        assert!(can(&tree, &soldier, 6));
        assert!(!can(&tree, &soldier, 7));
        assert!(!can(&tree, &soldier, 4));
    }

    #[test]
    fn test_system_admin_requires_reserved_username() {
        let tree = sample_tree();
        let root = User::new(1, "admin", Role::Admin);
        let self_registered = User::new(2, "cpt_smith", Role::Admin).with_unit(9);

        assert!(can(&tree, &root, 11));
        assert!(!can(&tree, &self_registered, 11));
        assert!(!can(&tree, &self_registered, 2));
    }

    #[test]
    fn test_custom_admin_username() {
        let tree = sample_tree();
        let policy = HierarchyPolicy::builtin();
        let resolver = AccessResolver::new(&tree, &policy).with_admin_username("root");

        assert!(resolver.is_system_admin(&User::new(1, "root", Role::Admin)));
        assert!(!resolver.is_system_admin(&User::new(1, "admin", Role::Admin)));
    }

    #[test]
    fn test_company_roles_cannot_see_sibling_company() {
        let tree = sample_tree();

        assert!(!can(&tree, &user(Role::CompanyCommander, 2), 9));
        assert!(!can(&tree, &user(Role::FirstSergeant, 9), 2));
        assert!(!can(&tree, &user(Role::CompanyCommander, 9), 3));
    }

    #[test]
    fn test_platoon_leader_sees_sibling_platoon_under_same_company() {
        let tree = sample_tree();
        let pl = user(Role::PlatoonLeader, 3);

        assert!(can(&tree, &pl, 8));
        assert!(can(&tree, &pl, 10));
        assert!(!can(&tree, &pl, 2));
        assert!(!can(&tree, &pl, 9));
    }

    #[test]
    fn test_squad_leader_sees_team_under_sibling_squad() {
        let tree = sample_tree();
        assert!(can(&tree, &user(Role::SquadLeader, 4), 7));
    }

    #[test]
    fn test_commander_check_walks_chain_of_command() {
        let tree = sample_tree();
        let owner = user(Role::Commander, 3);

        assert!(can(&tree, &owner, 3));
        assert!(can(&tree, &owner, 7));
        assert!(can(&tree, &owner, 8));
        assert!(!can(&tree, &owner, 2));
        assert!(!can(&tree, &owner, 9));
    }

    fn scope_ids(tree: &UnitTree, home: UnitId) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> =
            AccessResolver::commander_scope(tree, tree.get_unit(home).unwrap())
                .iter()
                .map(|u| u.id)
                .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_commander_scope_is_whole_subtree() {
        let tree = sample_tree();
        assert_eq!(scope_ids(&tree, 3), vec![3, 4, 5, 6, 7]);

        // Echelons play no part, even when malformed or out of order
        let odd = UnitTree::new(vec![
            Unit::new(1, "Squad", Echelon::Squad),
            Unit::new(2, "Platoon", Echelon::Platoon).with_parent(1),
            Unit::new(3, "Team", Echelon::Team).with_parent(2),
            Unit::new(10, "Mystery", Echelon::Unknown),
            Unit::new(11, "Team", Echelon::Team).with_parent(10),
        ]);
        assert_eq!(scope_ids(&odd, 1), vec![1, 2, 3]);
        assert_eq!(scope_ids(&odd, 10), vec![10, 11]);
    }

    #[test]
    fn test_missing_home_unit_denies() {
        let tree = sample_tree();
        let orphan = user(Role::BattalionCommander, 404);
        assert!(!can(&tree, &orphan, 2));

        let unassigned = User::new(5, "new", Role::BattalionCommander);
        assert!(!can(&tree, &unassigned, 2));
    }

    #[test]
    fn test_policy_gap_denies_but_self_unit_still_visible() {
        let tree = sample_tree();
        let policy = HierarchyPolicy::builtin().without_role(Role::PlatoonLeader);
        let resolver = AccessResolver::new(&tree, &policy);
        let pl = user(Role::PlatoonLeader, 3);

        assert!(resolver.can_access_unit(&pl, tree.get_unit(3).unwrap()));
        assert!(!resolver.can_access_unit(&pl, tree.get_unit(4).unwrap()));
    }

    #[test]
    fn test_malformed_echelon_denies() {
        let tree = UnitTree::new(vec![
            Unit::new(1, "Company", Echelon::Company),
            Unit::new(2, "Mystery", Echelon::Unknown).with_parent(1),
        ]);
        assert!(!can(&tree, &user(Role::CompanyCommander, 1), 2));
    }

    #[test]
    fn test_cycle_denies_instead_of_looping() {
        let tree = UnitTree::new(vec![
            Unit::new(1, "Home", Echelon::Company),
            Unit::new(2, "A", Echelon::Squad).with_parent(3),
            Unit::new(3, "B", Echelon::Squad).with_parent(2),
        ]);
        assert!(!can(&tree, &user(Role::CompanyCommander, 1), 2));
        assert_eq!(scope_ids(&tree, 1), vec![1]);
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    fn arb_echelon() -> impl Strategy<Value = Echelon> {
        prop::sample::select(Echelon::ALL.to_vec())
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    /// Random forest: unit `i` may point at any earlier unit as parent, so
    /// the graph is acyclic by construction.
    fn arb_tree() -> impl Strategy<Value = UnitTree> {
        prop::collection::vec((arb_echelon(), any::<prop::sample::Index>(), any::<bool>()), 1..24)
            .prop_map(|specs| {
                let units = specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (echelon, parent, has_parent))| {
                        let unit = Unit::new(i as UnitId, format!("unit-{}", i), echelon);
                        if has_parent && i > 0 {
                            unit.with_parent(parent.index(i) as UnitId)
                        } else {
                            unit
                        }
                    });
                UnitTree::new(units)
            })
    }

    proptest! {
        #[test]
        fn prop_home_unit_always_visible(tree in arb_tree(), role in arb_role(), pick in any::<prop::sample::Index>()) {
            let units = tree.units();
            let home = units[pick.index(units.len())];
            let policy = HierarchyPolicy::builtin();
            let resolver = AccessResolver::new(&tree, &policy);
            let u = User::new(1, "someone", role).with_unit(home.id);
            prop_assert!(resolver.can_access_unit(&u, home));
        }

        #[test]
        fn prop_never_supervise_higher_echelon(
            tree in arb_tree(),
            role in arb_role(),
            a in any::<prop::sample::Index>(),
            b in any::<prop::sample::Index>(),
        ) {
            let units = tree.units();
            let home = units[a.index(units.len())];
            let target = units[b.index(units.len())];
            prop_assume!(home.echelon.rank() < target.echelon.rank());

            let policy = HierarchyPolicy::builtin();
            let resolver = AccessResolver::new(&tree, &policy);
            let u = User::new(1, "someone", role).with_unit(home.id);
            prop_assume!(!resolver.is_system_admin(&u));
            prop_assert!(!resolver.can_access_unit(&u, target));
        }
    }
}
