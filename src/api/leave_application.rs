use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::leave::LeaveEngine;
use crate::leave::workflow::{LeaveRequest, parse_decision};
use crate::model::leave_application::{ApplicationFilter, LeaveStatus};
use crate::store::LeaveStore;

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ApplicationQuery {
    /// Filter by applicant; members may only pass their own id
    #[schema(example = 1001)]
    pub user_id: Option<u64>,
    /// Filter by the year the leave starts in
    #[schema(example = 2026)]
    pub year: Option<i32>,
    /// pending, approved, rejected or all
    #[schema(example = "pending")]
    pub status: Option<String>,
}

impl ApplicationQuery {
    fn to_filter(&self) -> Result<ApplicationFilter, LeaveError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(s) => Some(
                LeaveStatus::from_str(s)
                    .map_err(|_| LeaveError::invalid(format!("Unknown status filter: {s}")))?,
            ),
        };

        Ok(ApplicationFilter {
            user_id: self.user_id,
            year: self.year,
            status,
        })
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideLeave {
    #[schema(example = "rejected")]
    pub status: String,
    #[schema(example = "Project deadline")]
    pub rejection_reason: Option<String>,
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leave/apply",
    request_body(
        content = LeaveRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave application submitted", body = Object, example = json!({
            "message": "Leave applied. Will deduct 1 day(s) from annual leave upon approval.",
            "data": { "id": 17, "status": "pending", "isLossOfPay": false },
            "info": {
                "isLossOfPay": false,
                "lossOfPayDays": 0.0,
                "leaveCategory": "annual",
                "willCutFromAnnual": true,
                "approvedAnnualLeavesThisMonth": 0
            }
        })),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not eligible for this leave type"),
        (status = 404, description = "No leave credit for the year")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    payload: web::Json<LeaveRequest>,
) -> actix_web::Result<impl Responder> {
    let applied = engine.apply(&auth.actor(), payload.into_inner()).await?;
    let application = &applied.application;

    Ok(HttpResponse::Created().json(json!({
        "message": applied.message(),
        "data": application,
        "info": {
            "isLossOfPay": application.is_loss_of_pay,
            "lossOfPayDays": application.loss_of_pay_days,
            "leaveCategory": application.leave_category,
            "willCutFromAnnual": applied.draws_from_annual,
            "approvedAnnualLeavesThisMonth": applied.approved_annual_this_month
        }
    })))
}

/// Approve or reject a pending leave application
#[utoipa::path(
    put,
    path = "/api/leave/applications/{application_id}/status",
    request_body = DecideLeave,
    params(
        ("application_id" = u64, Path, description = "ID of the leave application to decide")
    ),
    responses(
        (status = 200, description = "Leave application decided", body = LeaveApplication),
        (status = 400, description = "Status must be approved or rejected"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Application or leave credit not found"),
        (status = 409, description = "Application already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn decide_application<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    path: web::Path<u64>,
    body: web::Json<DecideLeave>,
) -> actix_web::Result<impl Responder> {
    let status = parse_decision(&body.status)?;
    let body = body.into_inner();

    let application = engine
        .decide(&auth.actor(), path.into_inner(), status, body.rejection_reason)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave application {} successfully", application.status),
        "data": application
    })))
}

/// List leave applications, newest first
#[utoipa::path(
    get,
    path = "/api/leave/applications",
    params(ApplicationQuery),
    responses(
        (status = 200, description = "Leave applications", body = [LeaveApplication]),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_applications<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    query: web::Query<ApplicationQuery>,
) -> actix_web::Result<impl Responder> {
    let filter = query.to_filter()?;
    let applications = engine.list_applications(&auth.actor(), filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave applications fetched successfully",
        "data": applications
    })))
}

/// Pending leave applications, oldest first
#[utoipa::path(
    get,
    path = "/api/leave/applications/pending",
    responses(
        (status = 200, description = "Pending queue", body = [LeaveApplication]),
        (status = 403, description = "SuperAdmin/TeamLead only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_applications<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
) -> actix_web::Result<impl Responder> {
    let applications = engine.pending_applications(&auth.actor()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Pending leave applications fetched successfully",
        "data": applications
    })))
}

/// Get one leave application
#[utoipa::path(
    get,
    path = "/api/leave/applications/{application_id}",
    params(
        ("application_id" = u64, Path, description = "ID of the leave application to fetch")
    ),
    responses(
        (status = 200, description = "Leave application found", body = LeaveApplication),
        (status = 403, description = "Not your application"),
        (status = 404, description = "Leave application not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_application<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let application = engine.get_application(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(application))
}
