//! Persistence seam for the leave engine.
//!
//! The engine only talks to a [`LeaveStore`]. Production runs on [`mysql::MySqlStore`];
//! the unit tests run on the in-memory store.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use crate::error::LeaveResult;
use crate::model::leave_application::{
    ApplicationFilter, LeaveApplication, NewLeaveApplication, Review,
};
use crate::model::leave_credit::{LeaveCredit, NewLeaveCredit, SpecialTotals};
use crate::model::role::Role;
use crate::model::user::User;

#[allow(async_fn_in_trait)]
pub trait LeaveStore {
    async fn find_user_by_email(&self, email: &str) -> LeaveResult<Option<User>>;

    async fn find_user(&self, id: u64) -> LeaveResult<Option<User>>;

    /// Active users whose role is one of `roles`, ordered by id.
    async fn active_users_with_roles(&self, roles: &[Role]) -> LeaveResult<Vec<User>>;

    async fn credits_exist_for_year(&self, year: i32) -> LeaveResult<bool>;

    /// Writes the whole batch or nothing. A row that already exists for its
    /// `(user_id, year)` fails the batch with `AlreadyProvisioned`.
    async fn insert_credits(&self, credits: &[NewLeaveCredit]) -> LeaveResult<u64>;

    async fn find_credit(&self, user_id: u64, year: i32) -> LeaveResult<Option<LeaveCredit>>;

    /// Ledger rows of `year` that belong to non-administrators, newest first.
    async fn list_credits(&self, year: i32) -> LeaveResult<Vec<LeaveCredit>>;

    /// Overwrites the special-leave totals of one row under a row lock.
    /// Rejects a total below the bucket's current `used`.
    async fn update_special_totals(
        &self,
        credit_id: u64,
        totals: &SpecialTotals,
    ) -> LeaveResult<LeaveCredit>;

    async fn count_approved_annual(&self, user_id: u64, year: i32, month: u32) -> LeaveResult<u64>;

    async fn insert_application(
        &self,
        application: &NewLeaveApplication,
    ) -> LeaveResult<LeaveApplication>;

    async fn find_application(&self, id: u64) -> LeaveResult<Option<LeaveApplication>>;

    /// Matching applications, newest first.
    async fn list_applications(&self, filter: &ApplicationFilter) -> LeaveResult<Vec<LeaveApplication>>;

    /// Moves a pending application to its terminal status and, when approved,
    /// applies its ledger settlement. Both writes commit together or not at all.
    ///
    /// Fails with `NotFound`, `InvalidTransition` when the application is no
    /// longer pending, or `CreditMissing` when an approval has no ledger row.
    async fn settle_application(&self, id: u64, review: &Review) -> LeaveResult<LeaveApplication>;
}
