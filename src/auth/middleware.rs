use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::{debug, error};

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::leave::LeaveEngine;
use crate::store::LeaveStore;

fn unauthorized(req: ServiceRequest, body: serde_json::Value) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(body);
    req.into_response(resp.map_into_boxed_body())
}

/// Verifies the bearer token, then reloads the caller so that deactivation and
/// role changes apply before the token expires.
pub async fn auth_middleware<S: LeaveStore + 'static>(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_owned(),
            Err(_) => {
                return Ok(unauthorized(
                    req,
                    json!({"error": "Invalid Authorization header encoding"}),
                ));
            }
        },
        None => {
            return Ok(unauthorized(req, json!({"error": "Missing Authorization header"})));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            return Ok(unauthorized(
                req,
                json!({"error": "Authorization header must start with Bearer"}),
            ));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            return Ok(unauthorized(
                req,
                json!({"error": "Invalid or expired token", "details": e}),
            ));
        }
    };

    let engine = req
        .app_data::<Data<LeaveEngine<S>>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Leave engine missing"))?;

    let user = match engine.store().find_user(claims.user_id).await {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => {
            debug!(user_id = claims.user_id, email = %claims.sub, "Token of unknown or inactive user");
            return Ok(unauthorized(req, json!({"error": "Account is inactive or missing"})));
        }
        Err(e) => {
            error!(error = %e, user_id = claims.user_id, "Failed to load authenticated user");
            return Err(actix_web::error::ErrorInternalServerError("Internal Server Error"));
        }
    };

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });

    next.call(req).await
}
