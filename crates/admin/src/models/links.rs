//! Admin role/permission link sets.
//!
//! An edit replaces an admin's links with exactly the submitted sets. The
//! store applies the change as a [`LinkDiff`]: links missing from the new set
//! are deleted, new ones are inserted, and untouched links stay as they are.

use std::collections::BTreeSet;

use backoffice_core::{PermissionId, RoleId};

/// The complete set of roles and permissions linked to one admin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminLinks {
    pub roles: BTreeSet<RoleId>,
    pub permissions: BTreeSet<PermissionId>,
}

impl AdminLinks {
    /// Build link sets; duplicate IDs collapse.
    pub fn new(
        roles: impl IntoIterator<Item = RoleId>,
        permissions: impl IntoIterator<Item = PermissionId>,
    ) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Changes that turn `self` into `desired`.
    #[must_use]
    pub fn diff_to(&self, desired: &Self) -> (LinkDiff<RoleId>, LinkDiff<PermissionId>) {
        (
            LinkDiff::between(&self.roles, &desired.roles),
            LinkDiff::between(&self.permissions, &desired.permissions),
        )
    }
}

/// Links to insert and delete to move from one set to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDiff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T: Ord + Copy> LinkDiff<T> {
    /// Compute `desired - existing` and `existing - desired`.
    #[must_use]
    pub fn between(existing: &BTreeSet<T>, desired: &BTreeSet<T>) -> Self {
        Self {
            added: desired.difference(existing).copied().collect(),
            removed: existing.difference(desired).copied().collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Apply to `set` in place.
    pub fn apply(&self, set: &mut BTreeSet<T>) {
        for id in &self.removed {
            set.remove(id);
        }
        set.extend(self.added.iter().copied());
    }
}
