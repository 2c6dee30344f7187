use crate::{
    api::{category, leave_request, statistics},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::resource("/register")
            .wrap(register_limiter)
            .route(web::post().to(handlers::register)),
    );
    cfg.service(
        web::resource("/login")
            .wrap(login_limiter.clone())
            .route(web::post().to(handlers::login)),
    );
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope("/categorie")
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter.clone())
            .service(
                web::resource("")
                    .route(web::get().to(category::category_list))
                    .route(web::post().to(category::create_category)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(category::get_category))
                    .route(web::put().to(category::update_category))
                    .route(web::delete().to(category::delete_category)),
            ),
    );
    cfg.service(
        web::scope("/permessi")
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::resource("")
                    .route(web::get().to(leave_request::leave_list))
                    .route(web::post().to(leave_request::create_leave)),
            )
            // fixed segments must come before /{id}
            .service(
                web::resource("/da-approvare")
                    .route(web::get().to(leave_request::pending_queue)),
            )
            .service(
                web::resource("/statistiche")
                    .route(web::get().to(statistics::leave_statistics)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(leave_request::get_leave))
                    .route(web::put().to(leave_request::update_leave))
                    .route(web::delete().to(leave_request::delete_leave)),
            )
            .service(
                web::resource("/{id}/approva")
                    .route(web::put().to(leave_request::approve_leave)),
            )
            .service(
                web::resource("/{id}/rifiuta")
                    .route(web::put().to(leave_request::reject_leave)),
            ),
    );
}
