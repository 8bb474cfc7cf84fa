use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Errors surfaced by the check-in and marketplace endpoints.
///
/// Everything except `Internal` is an expected, user-correctable condition and
/// is returned with its message as-is.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Please sign in before scanning")]
    AuthenticationRequired,

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "Invalid or expired QR code, please rescan")]
    InvalidToken,

    #[display(fmt = "Location permission is needed to check in at the office")]
    LocationRequired,

    #[display(
        fmt = "You are {:.0} m from the office (allowed {:.0} m). Move closer to the office and rescan",
        distance,
        allowed
    )]
    OutsideGeofence { distance: f64, allowed: f64 },

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "Internal Server Error")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::AuthenticationRequired => "authentication_required",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidToken => "invalid_token",
            AppError::LocationRequired => "location_required",
            AppError::OutsideGeofence { .. } => "outside_geofence",
            AppError::Conflict(_) => "conflict",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Storage failure");
        AppError::Internal(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::OutsideGeofence { .. } => StatusCode::FORBIDDEN,
            AppError::InvalidToken | AppError::LocationRequired | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });

        if let AppError::OutsideGeofence { distance, allowed } = self {
            body["distance_m"] = json!(distance.round());
            body["allowed_m"] = json!(allowed);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
