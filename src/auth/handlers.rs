use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    leave::LeaveEngine,
    models::{LoginReqDto, LoginResponse},
    store::LeaveStore,
};

fn invalid_credentials() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" }))
}

/// Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(engine, config, user),
    fields(email = %user.email)
)]
pub async fn login<S: LeaveStore + 'static>(
    user: web::Json<LoginReqDto>,
    engine: web::Data<LeaveEngine<S>>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({ "error": "Email and password required" }));
    }

    let db_user = match engine.store().find_user_by_email(user.email.trim()).await {
        Ok(Some(found)) if found.is_active => {
            debug!(user_id = found.id, "User found");
            found
        }
        Ok(Some(found)) => {
            info!(user_id = found.id, "Invalid credentials: account inactive");
            return invalid_credentials();
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return invalid_credentials();
    }

    let access_token = match generate_access_token(
        db_user.id,
        db_user.email.clone(),
        db_user.role.id(),
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!(user_id = db_user.id, name = %db_user.name, role = %db_user.role, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        expires_in: config.access_token_ttl,
    })
}
