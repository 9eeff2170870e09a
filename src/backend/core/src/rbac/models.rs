//! RBAC data models: Role, Resource, Action, Permission, RoleSet and Principal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// A tag that does not name a known role, resource or action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} tag: {tag}")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub tag: String,
}

impl UnknownTag {
    fn new(kind: &'static str, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role
// ═══════════════════════════════════════════════════════════════════════════════

/// The four platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "businessOwner")]
    BusinessOwner,
    #[serde(rename = "businessStaff")]
    BusinessStaff,
    #[serde(rename = "customer")]
    Customer,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Self::Admin,
        Self::BusinessOwner,
        Self::BusinessStaff,
        Self::Customer,
    ];

    /// The wire tag carried in credentials.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::BusinessOwner => "businessOwner",
            Self::BusinessStaff => "businessStaff",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownTag::new("role", s))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resource
// ═══════════════════════════════════════════════════════════════════════════════

/// Entity types used as the unit of access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Business,
    User,
    WaitlistEntry,
    Review,
    ServiceGroup,
    AdminUser,
    Appointment,
    ProductOrderItem,
    ProductOrder,
    Product,
    StaffRecurringAvailability,
    StaffServiceAssignment,
}

impl Resource {
    pub const ALL: [Resource; 12] = [
        Self::Business,
        Self::User,
        Self::WaitlistEntry,
        Self::Review,
        Self::ServiceGroup,
        Self::AdminUser,
        Self::Appointment,
        Self::ProductOrderItem,
        Self::ProductOrder,
        Self::Product,
        Self::StaffRecurringAvailability,
        Self::StaffServiceAssignment,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::User => "user",
            Self::WaitlistEntry => "waitlist-entry",
            Self::Review => "review",
            Self::ServiceGroup => "service-group",
            Self::AdminUser => "admin-user",
            Self::Appointment => "appointment",
            Self::ProductOrderItem => "product-order-item",
            Self::ProductOrder => "product-order",
            Self::Product => "product",
            Self::StaffRecurringAvailability => "staff-recurring-availability",
            Self::StaffServiceAssignment => "staff-service-assignment",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.as_str() == s)
            .ok_or_else(|| UnknownTag::new("resource", s))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Action
// ═══════════════════════════════════════════════════════════════════════════════

/// CRUD-style operation tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Delete,
    Update,
    View,
}

impl Action {
    pub const ALL: [Action; 4] = [Self::Create, Self::Delete, Self::Update, Self::View];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::View => "view",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownTag::new("action", s))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permission
// ═══════════════════════════════════════════════════════════════════════════════

/// An action on a resource type, written `resource:action`
/// (for example `appointment:create`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// Parse a permission from a colon-separated string like `"appointment:view"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (resource, action) = s.split_once(':')?;
        Some(Self::new(resource.parse().ok()?, action.parse().ok()?))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RoleSet
// ═══════════════════════════════════════════════════════════════════════════════

/// The roles held by one principal. May be empty.
///
/// Built once at the identity boundary; the authorization path only ever sees
/// resolved enum tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve raw tags, returning the resolved set and the tags that matched
    /// no role. Surrounding whitespace is ignored; empty tags are dropped.
    pub fn from_tags<I, S>(tags: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roles = BTreeSet::new();
        let mut unknown = Vec::new();

        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() {
                continue;
            }
            match tag.parse::<Role>() {
                Ok(role) => {
                    roles.insert(role);
                }
                Err(_) => unknown.push(tag.to_string()),
            }
        }

        (Self(roles), unknown)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "[{}]", tags.join(","))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Principal
// ═══════════════════════════════════════════════════════════════════════════════

/// The resolved caller identity for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub roles: RoleSet,
}

impl Principal {
    pub fn new(user_id: Uuid, roles: impl Into<RoleSet>) -> Self {
        Self {
            user_id,
            roles: roles.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
