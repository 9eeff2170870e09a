//! Permission engine for evaluating authorization decisions.
//!
//! The engine answers the question:
//! "Does any of these roles allow action Y on resource Z?"

use metrics::counter;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::{Action, Permission, Resource, Role, RoleSet};
use super::roles::PermissionTable;
use crate::error::{Result, SalonError};

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The action is allowed by the named role.
    Allow { role: Role },
    /// The action is denied, with a reason.
    Deny(String),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permission Engine
// ═══════════════════════════════════════════════════════════════════════════════

/// Evaluates authorization checks against a shared, immutable
/// [`PermissionTable`]. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    table: Arc<PermissionTable>,
}

impl PermissionEngine {
    pub fn new(table: Arc<PermissionTable>) -> Self {
        Self { table }
    }

    /// Engine over [`PermissionTable::standard`].
    pub fn standard() -> Self {
        Self::new(Arc::new(PermissionTable::standard()))
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    /// `true` iff some role in `roles` grants `action` on `resource`.
    /// An empty role set is never authorized.
    pub fn authorize(&self, roles: &RoleSet, resource: Resource, action: Action) -> bool {
        roles
            .iter()
            .any(|role| self.table.allows(role, resource, action))
    }

    /// Like [`authorize`](Self::authorize), naming the granting role.
    pub fn check(&self, roles: &RoleSet, resource: Resource, action: Action) -> PolicyDecision {
        let permission = Permission::new(resource, action);

        if roles.is_empty() {
            return PolicyDecision::Deny(format!("no roles held for {}", permission));
        }

        for role in roles.iter() {
            if self.table.allows(role, resource, action) {
                debug!(
                    permission = %permission,
                    role = %role,
                    "Permission granted"
                );
                return PolicyDecision::Allow { role };
            }
        }

        PolicyDecision::Deny(format!("roles {} do not grant {}", roles, permission))
    }

    /// Returns `Ok(())` if allowed, a `Forbidden` error if denied.
    pub fn enforce(&self, roles: &RoleSet, resource: Resource, action: Action) -> Result<()> {
        self.grant(roles, resource, action).map(|_| ())
    }

    /// [`enforce`](Self::enforce), returning the role that granted access.
    pub fn grant(&self, roles: &RoleSet, resource: Resource, action: Action) -> Result<Role> {
        let decision = self.check(roles, resource, action);
        record_decision(resource, action, &decision);

        match decision {
            PolicyDecision::Allow { role } => Ok(role),
            PolicyDecision::Deny(reason) => {
                warn!(
                    resource = %resource,
                    action = %action,
                    roles = %roles,
                    reason = %reason,
                    "Permission denied"
                );
                Err(SalonError::forbidden(format!(
                    "missing permission {}",
                    Permission::new(resource, action)
                )))
            }
        }
    }

    /// Union of the actions every role in `roles` holds, per resource.
    pub fn effective_permissions(&self, roles: &RoleSet) -> BTreeMap<Resource, BTreeSet<Action>> {
        let mut perms: BTreeMap<Resource, BTreeSet<Action>> = BTreeMap::new();

        for role in roles.iter() {
            for (resource, actions) in self.table.resources(role) {
                perms.entry(resource).or_default().extend(actions.iter().copied());
            }
        }

        perms
    }
}

impl Default for PermissionEngine {
    fn default() -> Self {
        Self::standard()
    }
}

fn record_decision(resource: Resource, action: Action, decision: &PolicyDecision) {
    let outcome = if decision.is_allowed() { "allow" } else { "deny" };
    counter!(
        "salon_authz_decisions_total",
        "resource" => resource.as_str(),
        "action" => action.as_str(),
        "outcome" => outcome,
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
