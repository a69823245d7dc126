use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::leave::LeaveEngine;
use crate::leave::provisioning::ProvisionRequest;
use crate::model::leave_credit::{LeaveBucket, LeaveCredit, SpecialTotals};
use crate::store::LeaveStore;

#[derive(Serialize, ToSchema)]
pub struct BucketResponse {
    #[schema(example = 12.0)]
    pub total: f64,
    #[schema(example = 2.0)]
    pub used: f64,
    #[schema(example = 10.0)]
    pub remaining: f64,
}

impl From<&LeaveBucket> for BucketResponse {
    fn from(bucket: &LeaveBucket) -> Self {
        Self {
            total: bucket.total,
            used: bucket.used,
            remaining: bucket.remaining(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveCreditResponse {
    #[schema(example = 5)]
    pub id: u64,
    #[schema(example = 1001)]
    pub user_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    pub annual_leave: BucketResponse,
    pub sick_leave: BucketResponse,
    pub maternity_leave: BucketResponse,
    pub bereavement_leave: BucketResponse,
    #[schema(example = 1.5)]
    pub loss_of_pay_count: f64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub effective_from: NaiveDate,
    #[schema(example = 1)]
    pub created_by: Option<u64>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<&LeaveCredit> for LeaveCreditResponse {
    fn from(credit: &LeaveCredit) -> Self {
        Self {
            id: credit.id,
            user_id: credit.user_id,
            year: credit.year,
            annual_leave: (&credit.annual).into(),
            sick_leave: (&credit.sick).into(),
            maternity_leave: (&credit.maternity).into(),
            bereavement_leave: (&credit.bereavement).into(),
            loss_of_pay_count: credit.loss_of_pay_count,
            effective_from: credit.effective_from,
            created_by: credit.created_by,
            created_at: credit.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CreditQuery {
    /// Ledger owner; defaults to the caller
    #[schema(example = 1001)]
    pub user_id: Option<u64>,
    /// Calendar year; defaults to the current year
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

fn year_or_current(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| Utc::now().year())
}

/// Seed the yearly leave credits of every eligible user
#[utoipa::path(
    post,
    path = "/api/leave-credits/bulk",
    request_body = ProvisionRequest,
    responses(
        (status = 201, description = "Leave credits created", body = Object, example = json!({
            "message": "Leave credits successfully created for 42 users for 2026",
            "year": 2026,
            "createdCount": 42
        })),
        (status = 200, description = "No eligible users"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Credits for the year already exist")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Credit"
)]
pub async fn provision_credits<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    payload: web::Json<ProvisionRequest>,
) -> actix_web::Result<impl Responder> {
    let summary = engine
        .provision(&auth.actor(), payload.year, payload.effective_from)
        .await?;

    if summary.created_count == 0 {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "No eligible users found.",
            "year": summary.year,
            "createdCount": 0
        })));
    }

    Ok(HttpResponse::Created().json(json!({
        "message": format!(
            "Leave credits successfully created for {} users for {}",
            summary.created_count, summary.year
        ),
        "year": summary.year,
        "createdCount": summary.created_count
    })))
}

/// List every non-administrator ledger of a year
#[utoipa::path(
    get,
    path = "/api/leave-credits",
    params(CreditQuery),
    responses(
        (status = 200, description = "Ledgers of the year", body = [LeaveCreditResponse]),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Credit"
)]
pub async fn list_credits<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    query: web::Query<CreditQuery>,
) -> actix_web::Result<impl Responder> {
    let year = year_or_current(query.year);
    let credits = engine.list_credits(&auth.actor(), year).await?;
    let data: Vec<LeaveCreditResponse> = credits.iter().map(LeaveCreditResponse::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave credits fetched successfully for {year}"),
        "totalRecords": data.len(),
        "data": data
    })))
}

/// Set sick, maternity and bereavement totals on one ledger
#[utoipa::path(
    put,
    path = "/api/leave-credits/{credit_id}",
    request_body = SpecialTotals,
    params(
        ("credit_id" = u64, Path, description = "Leave credit ID")
    ),
    responses(
        (status = 200, description = "Leave credit updated", body = LeaveCreditResponse),
        (status = 400, description = "Invalid totals"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave credit not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Credit"
)]
pub async fn update_credit<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    path: web::Path<u64>,
    body: web::Json<SpecialTotals>,
) -> actix_web::Result<impl Responder> {
    let credit = engine
        .update_special_totals(&auth.actor(), path.into_inner(), body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave credit updated successfully",
        "data": LeaveCreditResponse::from(&credit)
    })))
}

/// Read one user's ledger for a year
#[utoipa::path(
    get,
    path = "/api/leave-credits/ledger",
    params(CreditQuery),
    responses(
        (status = 200, description = "Ledger found", body = LeaveCreditResponse),
        (status = 403, description = "Not your ledger"),
        (status = 404, description = "No ledger for the year")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Credit"
)]
pub async fn get_ledger<S: LeaveStore + 'static>(
    auth: AuthUser,
    engine: web::Data<LeaveEngine<S>>,
    query: web::Query<CreditQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    let year = year_or_current(query.year);
    let credit = engine.get_ledger(&auth.actor(), user_id, year).await?;

    Ok(HttpResponse::Ok().json(json!({ "data": LeaveCreditResponse::from(&credit) })))
}
