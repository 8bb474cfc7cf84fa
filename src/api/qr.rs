use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::qr::token::{QrPayload, QrSigner};
use crate::utils::geo::GeoPoint;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct OfficeQrQuery {
    /// Latitude of the display device
    #[schema(example = 23.8103)]
    pub lat: Option<f64>,
    /// Longitude of the display device
    #[schema(example = 90.4125)]
    pub lng: Option<f64>,
}

impl OfficeQrQuery {
    fn location(&self) -> Result<Option<GeoPoint>, AppError> {
        match (self.lat, self.lng) {
            (None, None) => Ok(None),
            (Some(lat), Some(lng)) => {
                let point = GeoPoint::new(lat, lng);
                if point.is_valid() {
                    Ok(Some(point))
                } else {
                    Err(AppError::BadRequest("Invalid coordinates".to_string()))
                }
            }
            _ => Err(AppError::BadRequest(
                "lat and lng must be given together".to_string(),
            )),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QrTokenResponse {
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
    /// seconds until the token stops scanning
    #[schema(example = 30)]
    pub expires_in: u64,
}

fn issue(signer: &QrSigner, payload: QrPayload, ttl: u64) -> Result<QrTokenResponse, AppError> {
    let token = signer.issue(payload, ttl).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign QR token");
        AppError::Internal("Failed to sign QR token".to_string())
    })?;

    Ok(QrTokenResponse {
        token,
        expires_in: ttl,
    })
}

/// Rotating office code for the front-desk display
#[utoipa::path(
    get,
    path = "/api/qr/office",
    params(OfficeQrQuery),
    responses(
        (status = 200, description = "Fresh office token", body = QrTokenResponse),
        (status = 400, description = "Invalid coordinates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/Executive only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "QR"
)]
pub async fn office_qr(
    auth: AuthUser,
    signer: web::Data<QrSigner>,
    config: web::Data<Config>,
    query: web::Query<OfficeQrQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin_or_executive()?;

    let location = query.location()?;
    let body = issue(&signer, QrPayload::Office { location }, config.office_qr_ttl)?;

    tracing::debug!(issuer = auth.user_id, pinned = location.is_some(), "Office QR issued");
    Ok(HttpResponse::Ok().json(body))
}

/// Short-lived personal badge for the caller
#[utoipa::path(
    get,
    path = "/api/qr/me",
    responses(
        (status = 200, description = "Fresh badge token", body = QrTokenResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "QR"
)]
pub async fn my_qr(
    auth: AuthUser,
    signer: web::Data<QrSigner>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    let body = issue(
        &signer,
        QrPayload::User {
            user_id: auth.user_id,
        },
        config.user_qr_ttl,
    )?;

    Ok(HttpResponse::Ok().json(body))
}
