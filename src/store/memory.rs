//! In-memory [`LeaveStore`] for tests. Every operation runs under one lock,
//! which gives the same all-or-nothing behaviour as the MySQL transactions.

use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

use super::LeaveStore;
use crate::error::{LeaveError, LeaveResult};
use crate::leave::ledger::{
    LedgerMutation, apply_special_totals, check_special_totals, settlement_for,
};
use crate::model::leave_application::{
    ApplicationFilter, LeaveApplication, LeaveCategory, LeaveStatus, NewLeaveApplication, Review,
};
use crate::model::leave_credit::{LeaveCredit, NewLeaveCredit, SpecialTotals};
use crate::model::role::Role;
use crate::model::user::User;

#[derive(Default)]
struct State {
    users: Vec<User>,
    credits: Vec<LeaveCredit>,
    applications: Vec<LeaveApplication>,
    next_credit_id: u64,
    next_application_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            state: Mutex::new(State { users, ..Default::default() }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    pub fn seed_credit(&self, credit: NewLeaveCredit) -> LeaveCredit {
        let mut state = self.lock();
        let credit = state.new_credit(&credit);
        state.credits.push(credit.clone());
        credit
    }

    /// Edits a ledger row in place, bypassing the engine.
    pub fn with_credit(&self, credit_id: u64, edit: impl FnOnce(&mut LeaveCredit)) {
        let mut state = self.lock();
        let credit = state
            .credits
            .iter_mut()
            .find(|c| c.id == credit_id)
            .expect("credit to edit exists");
        edit(credit);
    }

    pub fn set_active(&self, user_id: u64, is_active: bool) {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = is_active;
        }
    }

    pub fn remove_credit(&self, user_id: u64, year: i32) {
        self.lock().credits.retain(|c| !(c.user_id == user_id && c.year == year));
    }

    pub fn credit_count(&self) -> usize {
        self.lock().credits.len()
    }

    pub fn application_count(&self) -> usize {
        self.lock().applications.len()
    }
}

fn apply_settlement(mutation: LedgerMutation, credit: &mut LeaveCredit) {
    match mutation {
        LedgerMutation::Nothing => {}
        LedgerMutation::LossOfPay(days) => credit.loss_of_pay_count += days,
        LedgerMutation::Consume { bucket, days } => credit.bucket_mut(bucket).used += days,
    }
}

impl State {
    fn new_credit(&mut self, credit: &NewLeaveCredit) -> LeaveCredit {
        self.next_credit_id += 1;
        LeaveCredit {
            id: self.next_credit_id,
            user_id: credit.user_id,
            year: credit.year,
            annual: credit.annual,
            sick: credit.sick,
            maternity: credit.maternity,
            bereavement: credit.bereavement,
            loss_of_pay_count: 0.0,
            effective_from: credit.effective_from,
            created_by: Some(credit.created_by),
            created_at: Utc::now(),
        }
    }

    fn role_of(&self, user_id: u64) -> Option<Role> {
        self.users.iter().find(|u| u.id == user_id).map(|u| u.role)
    }
}

impl LeaveStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> LeaveResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user(&self, id: u64) -> LeaveResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn active_users_with_roles(&self, roles: &[Role]) -> LeaveResult<Vec<User>> {
        let mut users: Vec<User> = self
            .lock()
            .users
            .iter()
            .filter(|u| u.is_active && roles.contains(&u.role))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn credits_exist_for_year(&self, year: i32) -> LeaveResult<bool> {
        Ok(self.lock().credits.iter().any(|c| c.year == year))
    }

    async fn insert_credits(&self, credits: &[NewLeaveCredit]) -> LeaveResult<u64> {
        let mut state = self.lock();
        for new in credits {
            if state.credits.iter().any(|c| c.user_id == new.user_id && c.year == new.year) {
                return Err(LeaveError::AlreadyProvisioned(new.year));
            }
        }
        for new in credits {
            let credit = state.new_credit(new);
            state.credits.push(credit);
        }
        Ok(credits.len() as u64)
    }

    async fn find_credit(&self, user_id: u64, year: i32) -> LeaveResult<Option<LeaveCredit>> {
        Ok(self
            .lock()
            .credits
            .iter()
            .find(|c| c.user_id == user_id && c.year == year)
            .cloned())
    }

    async fn list_credits(&self, year: i32) -> LeaveResult<Vec<LeaveCredit>> {
        let state = self.lock();
        let mut credits: Vec<LeaveCredit> = state
            .credits
            .iter()
            .filter(|c| c.year == year && state.role_of(c.user_id) != Some(Role::SuperAdmin))
            .cloned()
            .collect();
        credits.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(credits)
    }

    async fn update_special_totals(&self, credit_id: u64, totals: &SpecialTotals) -> LeaveResult<LeaveCredit> {
        let mut state = self.lock();
        let credit = state
            .credits
            .iter_mut()
            .find(|c| c.id == credit_id)
            .ok_or_else(|| LeaveError::NotFound(format!("Leave credit {credit_id}")))?;
        check_special_totals(credit, totals)?;
        apply_special_totals(credit, totals);
        Ok(credit.clone())
    }

    async fn count_approved_annual(&self, user_id: u64, year: i32, month: u32) -> LeaveResult<u64> {
        Ok(self
            .lock()
            .applications
            .iter()
            .filter(|a| {
                a.user_id == user_id
                    && a.year == year
                    && a.month == month
                    && a.leave_category == LeaveCategory::Annual
                    && a.status == LeaveStatus::Approved
            })
            .count() as u64)
    }

    async fn insert_application(&self, new: &NewLeaveApplication) -> LeaveResult<LeaveApplication> {
        let mut state = self.lock();
        state.next_application_id += 1;
        let application = LeaveApplication {
            id: state.next_application_id,
            user_id: new.user_id,
            from_date: new.from_date,
            to_date: new.to_date,
            leave_category: new.leave_category,
            duration_type: new.duration_type,
            time_slot: new.time_slot.clone(),
            description: new.description.clone(),
            leave_days: new.leave_days,
            hours: new.hours,
            month: new.month,
            year: new.year,
            is_loss_of_pay: new.is_loss_of_pay,
            loss_of_pay_days: new.loss_of_pay_days,
            status: LeaveStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            applied_at: Utc::now(),
        };
        state.applications.push(application.clone());
        Ok(application)
    }

    async fn find_application(&self, id: u64) -> LeaveResult<Option<LeaveApplication>> {
        Ok(self.lock().applications.iter().find(|a| a.id == id).cloned())
    }

    async fn list_applications(&self, filter: &ApplicationFilter) -> LeaveResult<Vec<LeaveApplication>> {
        let mut applications: Vec<LeaveApplication> = self
            .lock()
            .applications
            .iter()
            .filter(|a| filter.user_id.is_none_or(|id| a.user_id == id))
            .filter(|a| filter.year.is_none_or(|year| a.year == year))
            .filter(|a| filter.status.is_none_or(|status| a.status == status))
            .cloned()
            .collect();
        applications.sort_by(|a, b| (b.applied_at, b.id).cmp(&(a.applied_at, a.id)));
        Ok(applications)
    }

    async fn settle_application(&self, id: u64, review: &Review) -> LeaveResult<LeaveApplication> {
        let mut state = self.lock();

        let current = state
            .applications
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| LeaveError::NotFound(format!("Leave application {id}")))?;
        if current.status.is_terminal() {
            return Err(LeaveError::InvalidTransition { id, status: current.status });
        }

        let mut decided = current.clone();
        decided.status = review.status;
        decided.reviewed_by = Some(review.reviewed_by);
        decided.reviewed_at = Some(review.reviewed_at);
        decided.rejection_reason = review.rejection_reason.clone();

        if decided.status == LeaveStatus::Approved {
            let credit = state
                .credits
                .iter_mut()
                .find(|c| c.user_id == decided.user_id && c.year == decided.year)
                .ok_or(LeaveError::CreditMissing { user_id: decided.user_id, year: decided.year })?;
            apply_settlement(settlement_for(&decided), credit);
        }

        if let Some(slot) = state.applications.iter_mut().find(|a| a.id == id) {
            *slot = decided.clone();
        }
        Ok(decided)
    }
}
