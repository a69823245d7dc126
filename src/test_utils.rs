//! Shared fixtures for the unit tests: a small staff directory on the
//! in-memory store and helpers to seed ledgers and build requests.

use chrono::NaiveDate;

use crate::leave::LeaveEngine;
use crate::leave::workflow::LeaveRequest;
use crate::model::leave_credit::{LeaveCredit, NewLeaveCredit};
use crate::model::role::Role;
use crate::model::user::User;
use crate::store::memory::MemoryStore;

pub const ADMIN: u64 = 1;
pub const MEMBER: u64 = 2;
pub const OTHER_MEMBER: u64 = 3;
pub const TEAM_LEAD: u64 = 4;
pub const PROJECT_LEAD: u64 = 5;
pub const INACTIVE_MEMBER: u64 = 6;

/// Password every fixture user's `password` hash stands for, when hashed.
pub const PASSWORD: &str = "correct horse battery staple";

pub fn user(id: u64, role: Role, is_active: bool) -> User {
    User {
        id,
        name: format!("User {id}"),
        email: format!("user{id}@example.com"),
        password: String::new(),
        role,
        is_active,
    }
}

pub fn staff() -> Vec<User> {
    vec![
        user(ADMIN, Role::SuperAdmin, true),
        user(MEMBER, Role::Member, true),
        user(OTHER_MEMBER, Role::Member, true),
        user(TEAM_LEAD, Role::TeamLead, true),
        user(PROJECT_LEAD, Role::ProjectLead, true),
        user(INACTIVE_MEMBER, Role::Member, false),
    ]
}

pub fn engine_with_staff() -> LeaveEngine<MemoryStore> {
    LeaveEngine::new(MemoryStore::with_users(staff()))
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

/// Seeds the default yearly ledger (12 annual days, nothing else) for one user.
pub fn seed_credit(engine: &LeaveEngine<MemoryStore>, user_id: u64, year: i32) -> LeaveCredit {
    let effective_from = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year");
    engine
        .store()
        .seed_credit(NewLeaveCredit::yearly_default(user_id, year, effective_from, ADMIN))
}

pub fn request(from: &str, to: &str, category: &str, duration: &str) -> LeaveRequest {
    LeaveRequest {
        from_date: from.to_string(),
        to_date: to.to_string(),
        leave_category: category.to_string(),
        duration_type: duration.to_string(),
        time_slot: None,
        description: None,
    }
}
