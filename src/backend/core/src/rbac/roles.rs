//! The role -> resource -> actions permission table.
//!
//! | Role          | Description                                                        |
//! |---------------|--------------------------------------------------------------------|
//! | admin         | Every action on every resource                                     |
//! | businessOwner | Runs a business: services, bookings, products, staff schedules     |
//! | businessStaff | Works in a business: reads the catalogue, handles product orders  |
//! | customer      | Books appointments, joins waitlists, writes reviews                |
//!
//! Pairs absent from the table grant nothing.

use std::collections::{HashMap, HashSet};

use super::models::{Action, Resource, Role};

const ALL: &[Action] = &Action::ALL;
const VIEW: &[Action] = &[Action::View];
const VIEW_UPDATE: &[Action] = &[Action::View, Action::Update];
const VIEW_DELETE: &[Action] = &[Action::View, Action::Delete];
const CREATE_VIEW: &[Action] = &[Action::Create, Action::View];
const CREATE_VIEW_UPDATE: &[Action] = &[Action::Create, Action::View, Action::Update];
const CREATE_VIEW_DELETE: &[Action] = &[Action::Create, Action::View, Action::Delete];

/// Immutable permission table.
///
/// Built once through [`PermissionTableBuilder`]; there is no mutation API
/// after [`PermissionTableBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    grants: HashMap<Role, HashMap<Resource, HashSet<Action>>>,
}

impl PermissionTable {
    pub fn builder() -> PermissionTableBuilder {
        PermissionTableBuilder::default()
    }

    /// The platform's standard table.
    pub fn standard() -> Self {
        use Resource::*;

        let mut builder = Self::builder();

        for resource in Resource::ALL {
            builder = builder.grant(Role::Admin, resource, ALL);
        }

        builder = builder
            .grant(Role::BusinessOwner, Business, ALL)
            .grant(Role::BusinessOwner, WaitlistEntry, ALL)
            .grant(Role::BusinessOwner, ServiceGroup, ALL)
            .grant(Role::BusinessOwner, Appointment, ALL)
            .grant(Role::BusinessOwner, ProductOrderItem, ALL)
            .grant(Role::BusinessOwner, ProductOrder, ALL)
            .grant(Role::BusinessOwner, Product, ALL)
            .grant(Role::BusinessOwner, StaffRecurringAvailability, ALL)
            .grant(Role::BusinessOwner, StaffServiceAssignment, ALL)
            .grant(Role::BusinessOwner, User, VIEW_UPDATE)
            .grant(Role::BusinessOwner, Review, VIEW_DELETE);

        // No entries for waitlist-entry, service-group, appointment, review or
        // admin-user: staff are denied those outright.
        builder = builder
            .grant(Role::BusinessStaff, Business, VIEW)
            .grant(Role::BusinessStaff, User, VIEW)
            .grant(Role::BusinessStaff, Product, VIEW)
            .grant(Role::BusinessStaff, StaffServiceAssignment, VIEW)
            .grant(Role::BusinessStaff, ProductOrder, CREATE_VIEW_UPDATE)
            .grant(Role::BusinessStaff, ProductOrderItem, CREATE_VIEW_UPDATE)
            .grant(Role::BusinessStaff, StaffRecurringAvailability, ALL);

        builder
            .grant(Role::Customer, Business, VIEW)
            .grant(Role::Customer, ServiceGroup, VIEW)
            .grant(Role::Customer, Product, VIEW)
            .grant(Role::Customer, User, VIEW_UPDATE)
            .grant(Role::Customer, WaitlistEntry, CREATE_VIEW_DELETE)
            .grant(Role::Customer, Review, ALL)
            .grant(Role::Customer, Appointment, CREATE_VIEW_UPDATE)
            .grant(Role::Customer, ProductOrder, CREATE_VIEW)
            .grant(Role::Customer, ProductOrderItem, CREATE_VIEW)
            .build()
    }

    /// Whether `role` may perform `action` on `resource`.
    pub fn allows(&self, role: Role, resource: Resource, action: Action) -> bool {
        self.grants
            .get(&role)
            .and_then(|resources| resources.get(&resource))
            .is_some_and(|actions| actions.contains(&action))
    }

    /// The actions `role` holds on `resource`, if any.
    pub fn actions(&self, role: Role, resource: Resource) -> Option<&HashSet<Action>> {
        self.grants.get(&role)?.get(&resource)
    }

    /// Every resource `role` holds at least one action on.
    pub fn resources(&self, role: Role) -> impl Iterator<Item = (Resource, &HashSet<Action>)> {
        self.grants
            .get(&role)
            .into_iter()
            .flat_map(|resources| resources.iter().map(|(r, a)| (*r, a)))
    }
}

/// Builder for [`PermissionTable`]. Grants are additive.
#[derive(Debug, Default)]
pub struct PermissionTableBuilder {
    grants: HashMap<Role, HashMap<Resource, HashSet<Action>>>,
}

impl PermissionTableBuilder {
    pub fn grant(mut self, role: Role, resource: Resource, actions: &[Action]) -> Self {
        if actions.is_empty() {
            return self;
        }
        self.grants
            .entry(role)
            .or_default()
            .entry(resource)
            .or_default()
            .extend(actions.iter().copied());
        self
    }

    pub fn build(self) -> PermissionTable {
        PermissionTable {
            grants: self.grants,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        let table = PermissionTable::standard();
        for resource in Resource::ALL {
            for action in Action::ALL {
                assert!(table.allows(Role::Admin, resource, action), "{resource}:{action}");
            }
        }
    }

    #[test]
    fn test_business_owner_permissions() {
        let table = PermissionTable::standard();
        assert!(table.allows(Role::BusinessOwner, Resource::Appointment, Action::Delete));
        assert!(table.allows(Role::BusinessOwner, Resource::User, Action::Update));
        assert!(!table.allows(Role::BusinessOwner, Resource::User, Action::Delete));
        assert!(table.allows(Role::BusinessOwner, Resource::Review, Action::Delete));
        assert!(!table.allows(Role::BusinessOwner, Resource::Review, Action::Create));
        assert!(!table.allows(Role::BusinessOwner, Resource::AdminUser, Action::View));
    }

    #[test]
    fn test_business_staff_gaps_are_denied() {
        let table = PermissionTable::standard();
        for resource in [
            Resource::WaitlistEntry,
            Resource::ServiceGroup,
            Resource::Appointment,
            Resource::Review,
            Resource::AdminUser,
        ] {
            assert!(table.actions(Role::BusinessStaff, resource).is_none());
            for action in Action::ALL {
                assert!(!table.allows(Role::BusinessStaff, resource, action));
            }
        }
        assert!(table.allows(Role::BusinessStaff, Resource::StaffRecurringAvailability, Action::Delete));
        assert!(!table.allows(Role::BusinessStaff, Resource::ProductOrder, Action::Delete));
    }

    #[test]
    fn test_customer_permissions() {
        let table = PermissionTable::standard();
        assert!(table.allows(Role::Customer, Resource::Appointment, Action::Create));
        assert!(table.allows(Role::Customer, Resource::Appointment, Action::Update));
        assert!(!table.allows(Role::Customer, Resource::Appointment, Action::Delete));
        assert!(!table.allows(Role::Customer, Resource::WaitlistEntry, Action::Update));
        assert!(table.allows(Role::Customer, Resource::Review, Action::Delete));
        assert!(!table.allows(Role::Customer, Resource::ProductOrder, Action::Update));
    }

    #[test]
    fn test_empty_grant_adds_no_entry() {
        let table = PermissionTable::builder()
            .grant(Role::Customer, Resource::Product, &[])
            .build();
        assert!(table.actions(Role::Customer, Resource::Product).is_none());
        assert_eq!(table.resources(Role::Customer).count(), 0);
    }

    #[test]
    fn test_builder_grants_are_additive() {
        let table = PermissionTable::builder()
            .grant(Role::BusinessStaff, Resource::Appointment, VIEW)
            .grant(Role::BusinessStaff, Resource::Appointment, &[Action::Update])
            .build();
        let actions = table.actions(Role::BusinessStaff, Resource::Appointment).unwrap();
        assert_eq!(actions.len(), 2);
    }
}
