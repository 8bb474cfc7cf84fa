use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::{role::Role, user::Actor};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by auth_middleware on protected routes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        ready(AuthUser::from_bearer(req, config).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    /// Reads `Authorization: Bearer <access token>` and resolves the identity.
    pub fn from_bearer(req: &HttpRequest, config: &Config) -> Result<AuthUser, &'static str> {
        let header = req
            .headers()
            .get("Authorization")
            .ok_or("Missing Authorization header")?
            .to_str()
            .map_err(|_| "Invalid Authorization header encoding")?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or("Authorization header must start with Bearer")?;

        let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            "Invalid or expired token"
        })?;

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
        })
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Admins and executives may run the front-desk display
    pub fn require_admin_or_executive(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Executive) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin/Executive only"))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::{SECRET, session_token};
    use crate::models::TokenType;
    use actix_web::test::TestRequest;

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

    async fn extract(req: TestRequest) -> Option<AuthUser> {
        let (req, mut payload) = req.app_data(Data::new(config())).to_http_parts();
        Option::<AuthUser>::from_request(&req, &mut payload)
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn bearer_token_becomes_identity() {
        let token = session_token(7, 1, TokenType::Access, 60);
        let user = extract(
            TestRequest::default().insert_header(("Authorization", format!("Bearer {token}"))),
        )
        .await
        .unwrap();

        assert_eq!(user.user_id, 7);
        assert_eq!(user.role, Role::Admin);
        assert!(user.require_admin().is_ok());
        assert_eq!(user.actor().id, 7);
    }

    #[actix_web::test]
    async fn missing_or_bad_token_is_anonymous() {
        assert!(extract(TestRequest::default()).await.is_none());

        let bad = TestRequest::default().insert_header(("Authorization", "Bearer nonsense"));
        assert!(extract(bad).await.is_none());

        let unknown_role = session_token(7, 42, TokenType::Access, 60);
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {unknown_role}")));
        assert!(extract(req).await.is_none());
    }

    #[test]
    fn bearer_rejection_reasons() {
        let config = config();
        let reason = |req: TestRequest| AuthUser::from_bearer(&req.to_http_request(), &config).unwrap_err();

        assert_eq!(reason(TestRequest::default()), "Missing Authorization header");
        assert_eq!(
            reason(TestRequest::default().insert_header(("Authorization", "Basic abc"))),
            "Authorization header must start with Bearer"
        );
        assert_eq!(
            reason(TestRequest::default().insert_header(("Authorization", "Bearer nonsense"))),
            "Invalid or expired token"
        );

        let token = session_token(7, 42, TokenType::Access, 60);
        let req = TestRequest::default().insert_header(("Authorization", format!("Bearer {token}")));
        assert_eq!(reason(req), "Invalid role");

        let token = session_token(7, 2, TokenType::Access, 60);
        let req = TestRequest::default().insert_header(("Authorization", format!("Bearer {token}")));
        let user = AuthUser::from_bearer(&req.to_http_request(), &config).unwrap();
        assert_eq!(user.username, "user7");
        assert_eq!(user.role, Role::Executive);
    }

    #[actix_web::test]
    async fn role_guards() {
        let token = session_token(3, 3, TokenType::Access, 60);
        let staff = extract(
            TestRequest::default().insert_header(("Authorization", format!("Bearer {token}"))),
        )
        .await
        .unwrap();
        assert!(staff.require_admin().is_err());
        assert!(staff.require_admin_or_executive().is_err());
    }
}
