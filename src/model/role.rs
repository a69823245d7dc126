use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    SuperAdmin = 1,
    Member = 2,
    TeamLead = 3,
    ProjectLead = 4,
}

impl Role {
    /// Roles that hold a leave ledger and may apply for leave.
    pub const LEAVE_ELIGIBLE: [Role; 3] = [Role::Member, Role::TeamLead, Role::ProjectLead];

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::Member),
            3 => Some(Role::TeamLead),
            4 => Some(Role::ProjectLead),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn is_admin(self) -> bool {
        self == Role::SuperAdmin
    }

    /// Admins and team leads review the application queue.
    pub fn can_read_all_applications(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::TeamLead)
    }
}
