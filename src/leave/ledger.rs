use tracing::info;

use super::LeaveEngine;
use crate::error::{LeaveError, LeaveResult};
use crate::model::leave_application::{LeaveApplication, LeaveStatus};
use crate::model::leave_credit::{BucketKind, LeaveCredit, SpecialTotals};
use crate::model::user::Actor;
use crate::store::LeaveStore;

/// The single ledger write a decided application causes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgerMutation {
    Nothing,
    LossOfPay(f64),
    Consume { bucket: BucketKind, days: f64 },
}

/// Settlement for an application moving to `application.status`.
///
/// Precedence: loss of pay first, then work from home, then the category's bucket.
/// Anything other than an approval settles to `Nothing`.
pub fn settlement_for(application: &LeaveApplication) -> LedgerMutation {
    if application.status != LeaveStatus::Approved {
        return LedgerMutation::Nothing;
    }
    if application.is_loss_of_pay {
        return LedgerMutation::LossOfPay(application.loss_of_pay_days);
    }
    match application.leave_category.bucket() {
        None => LedgerMutation::Nothing,
        Some(bucket) => LedgerMutation::Consume { bucket, days: application.leave_days },
    }
}

/// Checks an administrative edit against the row it is about to overwrite.
pub fn check_special_totals(credit: &LeaveCredit, totals: &SpecialTotals) -> LeaveResult<()> {
    for (kind, total) in totals.entries() {
        let Some(total) = total else { continue };
        if !total.is_finite() || total < 0.0 {
            return Err(LeaveError::invalid(format!("{kind} leave total must be a non-negative number")));
        }
        let used = credit.bucket(kind).used;
        if total < used {
            return Err(LeaveError::invalid(format!(
                "{kind} leave total {total} is below the {used} day(s) already used"
            )));
        }
    }
    Ok(())
}

pub fn apply_special_totals(credit: &mut LeaveCredit, totals: &SpecialTotals) {
    for (kind, total) in totals.entries() {
        if let Some(total) = total {
            credit.bucket_mut(kind).total = total;
        }
    }
}

impl<S: LeaveStore> LeaveEngine<S> {
    /// One user's ledger. Non-administrators may only read their own.
    pub async fn get_ledger(&self, actor: &Actor, user_id: u64, year: i32) -> LeaveResult<LeaveCredit> {
        if !actor.role.is_admin() && actor.user_id != user_id {
            return Err(LeaveError::Forbidden("You can only view your own leave credit"));
        }

        self.store
            .find_credit(user_id, year)
            .await?
            .ok_or(LeaveError::CreditMissing { user_id, year })
    }

    pub async fn list_credits(&self, actor: &Actor, year: i32) -> LeaveResult<Vec<LeaveCredit>> {
        if !actor.role.is_admin() {
            return Err(LeaveError::Forbidden("Admin only"));
        }
        self.store.list_credits(year).await
    }

    /// Raises or lowers sick, maternity and bereavement entitlements on one row.
    pub async fn update_special_totals(
        &self,
        actor: &Actor,
        credit_id: u64,
        totals: SpecialTotals,
    ) -> LeaveResult<LeaveCredit> {
        if !actor.role.is_admin() {
            return Err(LeaveError::Forbidden("Admin only"));
        }
        if totals.is_empty() {
            return Err(LeaveError::invalid("No leave totals provided"));
        }

        let credit = self.store.update_special_totals(credit_id, &totals).await?;

        info!(
            credit_id,
            user_id = credit.user_id,
            year = credit.year,
            sick = credit.sick.total,
            maternity = credit.maternity.total,
            bereavement = credit.bereavement.total,
            "Leave credit totals updated"
        );

        Ok(credit)
    }
}
