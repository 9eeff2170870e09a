//! Appointment status machine.
//!
//! | Action     | Target      | Strict policy allows from |
//! |------------|-------------|---------------------------|
//! | approve    | confirmed   | pending                   |
//! | cancel     | cancelled   | pending, confirmed        |
//! | reschedule | pending     | pending, confirmed        |
//!
//! The permissive policy allows every action from every state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::{AppointmentPatch, AppointmentStatus, TimeWindow};
use crate::error::{Result, SalonError};
use crate::rbac::UnknownTag;

/// The three status actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAction {
    Approve,
    Cancel,
    Reschedule,
}

impl StatusAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Cancel => "cancel",
            Self::Reschedule => "reschedule",
        }
    }

    /// The status the action moves an appointment to.
    pub const fn target(&self) -> AppointmentStatus {
        match self {
            Self::Approve => AppointmentStatus::Confirmed,
            Self::Cancel => AppointmentStatus::Cancelled,
            Self::Reschedule => AppointmentStatus::Pending,
        }
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusAction {
    type Err = UnknownTag;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "cancel" => Ok(Self::Cancel),
            "reschedule" => Ok(Self::Reschedule),
            other => Err(UnknownTag {
                kind: "action",
                tag: other.to_string(),
            }),
        }
    }
}

/// A validated status action, carrying the new window for reschedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCommand {
    Approve,
    Cancel,
    Reschedule(TimeWindow),
}

impl StatusCommand {
    pub fn action(&self) -> StatusAction {
        match self {
            Self::Approve => StatusAction::Approve,
            Self::Cancel => StatusAction::Cancel,
            Self::Reschedule(_) => StatusAction::Reschedule,
        }
    }

    /// The update this command writes once the transition is allowed.
    pub fn into_patch(self) -> AppointmentPatch {
        match self {
            Self::Approve => AppointmentPatch::status(AppointmentStatus::Confirmed),
            Self::Cancel => AppointmentPatch::status(AppointmentStatus::Cancelled),
            Self::Reschedule(window) => AppointmentPatch::reschedule(window),
        }
    }
}

/// Which status actions are allowed from which states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Every action from every state.
    #[default]
    Permissive,
    /// Only the transitions in the module table.
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: AppointmentStatus, action: StatusAction) -> bool {
        use AppointmentStatus::*;

        match self {
            Self::Permissive => true,
            Self::Strict => matches!(
                (action, from),
                (StatusAction::Approve, Pending)
                    | (StatusAction::Cancel, Pending | Confirmed)
                    | (StatusAction::Reschedule, Pending | Confirmed)
            ),
        }
    }
}

/// Decides status transitions under a [`TransitionPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusMachine {
    policy: TransitionPolicy,
}

impl StatusMachine {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// The next status, or an invalid-state-transition error.
    pub fn transition(&self, from: AppointmentStatus, action: StatusAction) -> Result<AppointmentStatus> {
        if self.policy.allows(from, action) {
            Ok(action.target())
        } else {
            Err(SalonError::invalid_state_transition(from, action))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const STATES: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];
    const ACTIONS: [StatusAction; 3] = [
        StatusAction::Approve,
        StatusAction::Cancel,
        StatusAction::Reschedule,
    ];

    #[test]
    fn test_permissive_allows_everything() {
        let machine = StatusMachine::default();
        for from in STATES {
            for action in ACTIONS {
                assert_eq!(machine.transition(from, action).unwrap(), action.target());
            }
        }
    }

    #[test]
    fn test_permissive_approve_twice_stays_confirmed() {
        let machine = StatusMachine::new(TransitionPolicy::Permissive);
        let once = machine.transition(AppointmentStatus::Pending, StatusAction::Approve).unwrap();
        let twice = machine.transition(once, StatusAction::Approve).unwrap();
        assert_eq!(twice, AppointmentStatus::Confirmed);
    }

    #[test]
    fn test_strict_table() {
        let machine = StatusMachine::new(TransitionPolicy::Strict);

        assert_eq!(
            machine.transition(AppointmentStatus::Pending, StatusAction::Approve).unwrap(),
            AppointmentStatus::Confirmed
        );
        assert_eq!(
            machine.transition(AppointmentStatus::Confirmed, StatusAction::Reschedule).unwrap(),
            AppointmentStatus::Pending
        );
        assert!(machine.transition(AppointmentStatus::Confirmed, StatusAction::Approve).is_err());
        assert!(machine.transition(AppointmentStatus::Completed, StatusAction::Cancel).is_err());

        let err = machine
            .transition(AppointmentStatus::Cancelled, StatusAction::Approve)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert_eq!(err.user_message(), "cannot approve an appointment that is cancelled");
    }

    #[test]
    fn test_terminal_states_are_terminal_under_strict() {
        let policy = TransitionPolicy::Strict;
        for from in [AppointmentStatus::Cancelled, AppointmentStatus::Completed] {
            for action in ACTIONS {
                assert!(!policy.allows(from, action));
            }
        }
    }

    #[test]
    fn test_policy_serde() {
        let policy: TransitionPolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(policy, TransitionPolicy::Strict);
        assert_eq!(TransitionPolicy::default(), TransitionPolicy::Permissive);
    }

    #[test]
    fn test_command_patches() {
        assert_eq!(
            StatusCommand::Cancel.into_patch(),
            AppointmentPatch::status(AppointmentStatus::Cancelled)
        );
        assert!("archive".parse::<StatusAction>().is_err());
    }
}
