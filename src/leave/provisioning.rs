use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::LeaveEngine;
use crate::error::{LeaveError, LeaveResult};
use crate::model::leave_credit::NewLeaveCredit;
use crate::model::role::Role;
use crate::model::user::Actor;
use crate::store::LeaveStore;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub effective_from: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionSummary {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 42)]
    pub created_count: u64,
}

impl<S: LeaveStore> LeaveEngine<S> {
    /// Seeds the default ledger row of `year` for every active member, team lead
    /// and project lead.
    ///
    /// Runs once per year: if any row of `year` exists the call fails with
    /// `AlreadyProvisioned` before writing anything.
    pub async fn provision(
        &self,
        actor: &Actor,
        year: i32,
        effective_from: NaiveDate,
    ) -> LeaveResult<ProvisionSummary> {
        if !actor.role.is_admin() {
            return Err(LeaveError::Forbidden("Admin only"));
        }
        if year < 1 {
            return Err(LeaveError::invalid("Year must be a positive number"));
        }

        if self.store.credits_exist_for_year(year).await? {
            return Err(LeaveError::AlreadyProvisioned(year));
        }

        let users = self.store.active_users_with_roles(&Role::LEAVE_ELIGIBLE).await?;
        if users.is_empty() {
            warn!(year, "No eligible users found for leave credit provisioning");
            return Ok(ProvisionSummary { year, created_count: 0 });
        }

        let credits: Vec<NewLeaveCredit> = users
            .iter()
            .map(|user| NewLeaveCredit::yearly_default(user.id, year, effective_from, actor.user_id))
            .collect();

        let created_count = self.store.insert_credits(&credits).await?;

        info!(year, created_count, created_by = actor.user_id, "Leave credits provisioned");

        Ok(ProvisionSummary { year, created_count })
    }
}
