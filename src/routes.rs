use crate::{
    api::{attendance, qr, settings, swap},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("per_millisecond and burst_size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public: kiosks scan badges without a session; office scans read the optional bearer token
    cfg.service(
        web::scope("/checkin").service(
            web::resource("/scan")
                .wrap(scan_limiter.clone())
                .route(web::post().to(attendance::scan)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/qr")
                    // /qr/office
                    .service(web::resource("/office").route(web::get().to(qr::office_qr)))
                    // /qr/me
                    .service(web::resource("/me").route(web::get().to(qr::my_qr))),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/me").route(web::get().to(attendance::my_attendance)),
                    )
                    .service(
                        web::resource("/manual")
                            .route(web::post().to(attendance::manual_attendance)),
                    ),
            )
            .service(
                web::resource("/settings")
                    .route(web::get().to(settings::get_settings))
                    .route(web::put().to(settings::update_settings)),
            )
            .service(
                web::scope("/swaps")
                    // /swaps
                    .service(
                        web::resource("")
                            .route(web::get().to(swap::list_swaps))
                            .route(web::post().to(swap::create_swap)),
                    )
                    // /swaps/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(swap::get_swap))
                            .route(web::delete().to(swap::cancel_swap)),
                    )
                    // /swaps/{id}/claim
                    .service(
                        web::resource("/{id}/claim").route(web::post().to(swap::claim_swap)),
                    )
                    // /swaps/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(swap::approve_swap)),
                    )
                    // /swaps/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(swap::reject_swap)),
                    ),
            ),
    );
}
