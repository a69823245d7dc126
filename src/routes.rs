use crate::{
    api::{leave_application, leave_credit},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    store::LeaveStore,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Per-route limiter allowing `requests_per_min` with an equal burst
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(GovernorConfig::default);
    Governor::new(&cfg)
}

pub fn configure<S: LeaveStore + 'static>(cfg: &mut web::ServiceConfig, config: &Config) {
    // Public routes
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix)).service(
            web::resource("/login")
                .wrap(build_limiter(config.rate_login_per_min))
                .route(web::post().to(handlers::login::<S>)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware::<S>)) // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .service(
                web::scope("/leave-credits")
                    // /leave-credits
                    .service(
                        web::resource("").route(web::get().to(leave_credit::list_credits::<S>)),
                    )
                    // /leave-credits/bulk
                    .service(
                        web::resource("/bulk")
                            .route(web::post().to(leave_credit::provision_credits::<S>)),
                    )
                    // /leave-credits/ledger, ahead of /{id}
                    .service(
                        web::resource("/ledger").route(web::get().to(leave_credit::get_ledger::<S>)),
                    )
                    // /leave-credits/{id}
                    .service(
                        web::resource("/{id}").route(web::put().to(leave_credit::update_credit::<S>)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave/apply
                    .service(
                        web::resource("/apply")
                            .route(web::post().to(leave_application::apply_leave::<S>)),
                    )
                    // /leave/applications
                    .service(
                        web::resource("/applications")
                            .route(web::get().to(leave_application::list_applications::<S>)),
                    )
                    // /leave/applications/pending, ahead of /{id}
                    .service(
                        web::resource("/applications/pending")
                            .route(web::get().to(leave_application::pending_applications::<S>)),
                    )
                    // /leave/applications/{id}
                    .service(
                        web::resource("/applications/{id}")
                            .route(web::get().to(leave_application::get_application::<S>)),
                    )
                    // /leave/applications/{id}/status
                    .service(
                        web::resource("/applications/{id}/status")
                            .route(web::put().to(leave_application::decide_application::<S>)),
                    ),
            ),
    );
}
