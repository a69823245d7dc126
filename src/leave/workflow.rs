use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use std::str::FromStr;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::LeaveEngine;
use crate::error::{LeaveError, LeaveResult};
use crate::model::leave_application::{
    ApplicationFilter, DurationType, LeaveApplication, LeaveCategory, LeaveStatus,
    NewLeaveApplication, Review,
};
use crate::model::leave_credit::{LeaveBucket, LeaveCredit};
use crate::model::user::Actor;
use crate::store::LeaveStore;

/// Hours in a working day. Half a day is 4.5 hours.
pub const WORKDAY_HOURS: f64 = 9.0;

/// A leave request as submitted, before validation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[schema(example = "2026-03-02")]
    pub from_date: String,
    #[schema(example = "2026-03-04")]
    pub to_date: String,
    #[schema(example = "annual")]
    pub leave_category: String,
    #[schema(example = "fullday")]
    pub duration_type: String,
    #[schema(example = "9:30 AM to 6:30 PM")]
    pub time_slot: Option<String>,
    #[schema(example = "Family function")]
    pub description: Option<String>,
}

/// Validated calendar span of a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaveSpan {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub duration: DurationType,
    pub leave_days: f64,
}

impl LeaveSpan {
    pub fn new(from: NaiveDate, to: NaiveDate, duration: DurationType) -> LeaveResult<Self> {
        if to < from {
            return Err(LeaveError::invalid("End date cannot be before start date"));
        }

        if from == to {
            let leave_days = if duration.is_half_day() { 0.5 } else { 1.0 };
            return Ok(Self { from, to, duration, leave_days });
        }

        if duration.is_half_day() {
            return Err(LeaveError::invalid("Half day leave can only be applied for a single day"));
        }

        // inclusive of both endpoints
        let leave_days = ((to - from).num_days() + 1) as f64;
        Ok(Self { from, to, duration: DurationType::FullDay, leave_days })
    }

    pub fn hours(&self) -> f64 {
        self.leave_days * WORKDAY_HOURS
    }
}

/// How a request will be paid, frozen on the application at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_loss_of_pay: bool,
    pub loss_of_pay_days: f64,
    pub draws_from_annual: bool,
}

impl Classification {
    fn paid() -> Self {
        Self { is_loss_of_pay: false, loss_of_pay_days: 0.0, draws_from_annual: false }
    }

    fn loss_of_pay(days: f64) -> Self {
        Self { is_loss_of_pay: true, loss_of_pay_days: days, draws_from_annual: false }
    }
}

/// Decides whether a request is payable.
///
/// Annual leave is paid at most once per calendar month: once an annual
/// application is approved in the month, every further one is loss of pay.
/// Special leave is loss of pay when its bucket cannot cover the request.
pub fn classify(
    category: LeaveCategory,
    leave_days: f64,
    credit: &LeaveCredit,
    approved_annual_this_month: u64,
) -> LeaveResult<Classification> {
    match category {
        LeaveCategory::Annual => {
            if approved_annual_this_month >= 1 || credit.annual.remaining() < leave_days {
                Ok(Classification::loss_of_pay(leave_days))
            } else {
                Ok(Classification { draws_from_annual: true, ..Classification::paid() })
            }
        }
        LeaveCategory::WorkFromHome => Ok(Classification::paid()),
        LeaveCategory::Sick => classify_special(category, &credit.sick, leave_days),
        LeaveCategory::Maternity => classify_special(category, &credit.maternity, leave_days),
        LeaveCategory::Bereavement => classify_special(category, &credit.bereavement, leave_days),
    }
}

fn classify_special(
    category: LeaveCategory,
    bucket: &LeaveBucket,
    leave_days: f64,
) -> LeaveResult<Classification> {
    if bucket.total <= 0.0 {
        return Err(LeaveError::NotEligible(category));
    }
    if bucket.remaining() >= leave_days {
        Ok(Classification::paid())
    } else {
        Ok(Classification::loss_of_pay(leave_days))
    }
}

fn parse_date(field: &str, value: &str) -> LeaveResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| LeaveError::invalid(format!("Invalid date format for {field}: expected YYYY-MM-DD")))
}

/// Parses the reviewer's verdict. Only terminal statuses are accepted.
pub fn parse_decision(status: &str) -> LeaveResult<LeaveStatus> {
    match LeaveStatus::from_str(status.trim()) {
        Ok(status) if status.is_terminal() => Ok(status),
        _ => Err(LeaveError::invalid("Status must be 'approved' or 'rejected'")),
    }
}

/// Outcome of `apply`, with the context the caller reports back.
#[derive(Debug, Clone)]
pub struct AppliedLeave {
    pub application: LeaveApplication,
    pub draws_from_annual: bool,
    pub approved_annual_this_month: u64,
}

impl AppliedLeave {
    pub fn message(&self) -> String {
        let application = &self.application;
        if application.is_loss_of_pay {
            let days = application.loss_of_pay_days;
            let plural = if days > 1.0 { "s" } else { "" };
            format!("Leave applied as Loss of Pay ({days} day{plural}).")
        } else if self.draws_from_annual {
            format!(
                "Leave applied. Will deduct {} day(s) from annual leave upon approval.",
                application.leave_days
            )
        } else {
            "Leave applied successfully.".to_string()
        }
    }
}

impl<S: LeaveStore> LeaveEngine<S> {
    /// Validates and classifies a request, then records it as pending.
    ///
    /// Reads the ledger but never writes it. Two concurrent annual requests in
    /// the same month can both classify as paid; the monthly cap is not
    /// re-checked at approval.
    pub async fn apply(&self, actor: &Actor, request: LeaveRequest) -> LeaveResult<AppliedLeave> {
        if actor.role.is_admin() {
            return Err(LeaveError::invalid("SuperAdmin cannot apply for leave"));
        }

        let from = parse_date("fromDate", &request.from_date)?;
        let to = parse_date("toDate", &request.to_date)?;
        let category = LeaveCategory::from_str(request.leave_category.trim())
            .map_err(|_| LeaveError::invalid("Invalid leave category"))?;
        let duration = DurationType::from_str(request.duration_type.trim())
            .map_err(|_| LeaveError::invalid("Invalid duration type"))?;

        let span = LeaveSpan::new(from, to, duration)?;
        let year = from.year();
        let month = from.month();

        let credit = self
            .store
            .find_credit(actor.user_id, year)
            .await?
            .ok_or(LeaveError::CreditMissing { user_id: actor.user_id, year })?;

        let approved_annual_this_month = match category {
            LeaveCategory::Annual => {
                self.store.count_approved_annual(actor.user_id, year, month).await?
            }
            _ => 0,
        };

        let classification = classify(category, span.leave_days, &credit, approved_annual_this_month)?;

        let application = self
            .store
            .insert_application(&NewLeaveApplication {
                user_id: actor.user_id,
                from_date: span.from,
                to_date: span.to,
                leave_category: category,
                duration_type: span.duration,
                time_slot: request.time_slot.filter(|s| !s.trim().is_empty()),
                description: request.description.unwrap_or_default(),
                leave_days: span.leave_days,
                hours: span.hours(),
                month,
                year,
                is_loss_of_pay: classification.is_loss_of_pay,
                loss_of_pay_days: classification.loss_of_pay_days,
            })
            .await?;

        info!(
            application_id = application.id,
            user_id = actor.user_id,
            category = %category,
            leave_days = span.leave_days,
            is_loss_of_pay = classification.is_loss_of_pay,
            approved_annual_this_month,
            "Leave application submitted"
        );

        Ok(AppliedLeave {
            application,
            draws_from_annual: classification.draws_from_annual,
            approved_annual_this_month,
        })
    }

    /// Approves or rejects a pending application. Only an approval touches the ledger.
    pub async fn decide(
        &self,
        actor: &Actor,
        application_id: u64,
        status: LeaveStatus,
        rejection_reason: Option<String>,
    ) -> LeaveResult<LeaveApplication> {
        if !actor.role.is_admin() {
            return Err(LeaveError::Forbidden("Admin only"));
        }
        if !status.is_terminal() {
            return Err(LeaveError::invalid("Status must be 'approved' or 'rejected'"));
        }

        let review = Review {
            status,
            reviewed_by: actor.user_id,
            reviewed_at: Utc::now(),
            rejection_reason: match status {
                LeaveStatus::Rejected => rejection_reason.filter(|r| !r.trim().is_empty()),
                _ => None,
            },
        };

        match self.store.settle_application(application_id, &review).await {
            Ok(application) => {
                info!(
                    application_id,
                    user_id = application.user_id,
                    reviewed_by = actor.user_id,
                    status = %application.status,
                    category = %application.leave_category,
                    is_loss_of_pay = application.is_loss_of_pay,
                    "Leave application decided"
                );
                Ok(application)
            }
            Err(LeaveError::Storage(e)) => {
                error!(
                    error = %e,
                    application_id,
                    status = %status,
                    "Leave decision failed in storage; reconcile application status against the ledger"
                );
                Err(LeaveError::Storage(e))
            }
            Err(e) => {
                warn!(error = %e, application_id, "Leave decision refused");
                Err(e)
            }
        }
    }

    /// Applications visible to `actor`. Members and project leads only see their own.
    pub async fn list_applications(
        &self,
        actor: &Actor,
        mut filter: ApplicationFilter,
    ) -> LeaveResult<Vec<LeaveApplication>> {
        if !actor.role.can_read_all_applications() {
            if filter.user_id.is_some_and(|id| id != actor.user_id) {
                return Err(LeaveError::Forbidden("You can only view your own leave applications"));
            }
            filter.user_id = Some(actor.user_id);
        }
        self.store.list_applications(&filter).await
    }

    /// Pending queue, oldest first.
    pub async fn pending_applications(&self, actor: &Actor) -> LeaveResult<Vec<LeaveApplication>> {
        if !actor.role.can_read_all_applications() {
            return Err(LeaveError::Forbidden("SuperAdmin/TeamLead only"));
        }
        let filter = ApplicationFilter { status: Some(LeaveStatus::Pending), ..Default::default() };
        let mut pending = self.store.list_applications(&filter).await?;
        pending.reverse();
        Ok(pending)
    }

    pub async fn get_application(&self, actor: &Actor, id: u64) -> LeaveResult<LeaveApplication> {
        let application = self
            .store
            .find_application(id)
            .await?
            .ok_or_else(|| LeaveError::NotFound(format!("Leave application {id}")))?;

        if !actor.role.can_read_all_applications() && application.user_id != actor.user_id {
            return Err(LeaveError::Forbidden("You can only view your own leave applications"));
        }
        Ok(application)
    }
}
