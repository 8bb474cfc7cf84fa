use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

/// Rejects requests without a valid access token; the identity is left in the
/// request extensions for the `AuthUser` extractor.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let auth_user = match AuthUser::from_bearer(req.request(), config) {
        Ok(user) => user,
        Err(reason) => {
            tracing::debug!(path = req.path(), reason, "Request rejected");
            let resp = HttpResponse::Unauthorized().json(json!({ "error": reason }));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    tracing::debug!(
        user_id = auth_user.user_id,
        username = %auth_user.username,
        role = %auth_user.role,
        "Request authenticated"
    );
    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::{SECRET, session_token};
    use crate::models::TokenType;
    use actix_web::middleware::from_fn;
    use actix_web::{App, test, web};

    fn config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: SECRET.to_string(),
            server_addr: String::new(),
            qr_secret: "qr".to_string(),
            office_qr_ttl: 30,
            user_qr_ttl: 30,
            late_tolerance_minutes: 15,
            fallback_geofence_meters: 200.0,
            rate_scan_per_min: 120,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
        }
    }

    async fn whoami(auth: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(auth.user_id.to_string())
    }

    #[actix_web::test]
    async fn protected_scope_requires_access_token() {
        let app = test::init_service(
            App::new().app_data(Data::new(config())).service(
                web::scope("/api")
                    .wrap(from_fn(auth_middleware))
                    .route("/whoami", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", "Token abc"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let refresh = session_token(4, 3, TokenType::Refresh, 60);
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let token = session_token(4, 3, TokenType::Access, 60);
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"4"));
    }
}
