use crate::attendance::CheckinService;
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::attendance::{AttendanceMethod, AttendanceType};
use crate::store::{AttendanceStore, MySqlStore};
use crate::utils::geo::GeoPoint;
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

pub type CheckinSvc = CheckinService<MySqlStore>;

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Raw text decoded from the QR code
    #[schema(example = "USER:1000")]
    pub content: String,
    /// Scanning device location, if the user granted permission
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Number of records, newest first (max 100)
    #[schema(example = 30)]
    pub limit: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ManualAttendance {
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "CHECK_OUT")]
    pub kind: AttendanceType,
}

fn validate_location(location: Option<GeoPoint>) -> Result<(), AppError> {
    match location {
        Some(loc) if !loc.is_valid() => Err(AppError::BadRequest(
            "Invalid coordinates in location".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Scan endpoint: badge or office QR
#[utoipa::path(
    post,
    path = "/checkin/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = crate::attendance::CheckinResult),
        (status = 400, description = "Invalid or expired QR, or location missing", body = Object, example = json!({
            "error": "invalid_token",
            "message": "Invalid or expired QR code, please rescan"
        })),
        (status = 401, description = "Sign-in required"),
        (status = 403, description = "Wrong role for this scan, or outside the office geofence", body = Object, example = json!({
            "error": "outside_geofence",
            "message": "You are 1001 m from the office (allowed 50 m). Move closer to the office and rescan",
            "distance_m": 1001.0,
            "allowed_m": 50.0
        })),
        (status = 404, description = "Scanned user not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        (),
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_scan", skip_all, fields(actor = ?auth.as_ref().map(|a| a.user_id)))]
pub async fn scan(
    auth: Option<AuthUser>,
    service: web::Data<CheckinSvc>,
    payload: web::Json<ScanRequest>,
) -> actix_web::Result<HttpResponse> {
    validate_location(payload.location)?;

    let now = Local::now().naive_local();
    let result = service
        .resolve(
            auth.map(|a| a.actor()),
            &payload.content,
            payload.location,
            now,
        )
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Caller's own attendance history
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Most recent records first", body = [crate::model::attendance::AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    service: web::Data<CheckinSvc>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<HttpResponse> {
    let limit = query.limit.unwrap_or(30).clamp(1, 100);

    let records = service
        .store()
        .recent_attendance(auth.user_id, limit)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(records))
}

/// Admin correction: record a given event type for someone
#[utoipa::path(
    post,
    path = "/api/attendance/manual",
    request_body = ManualAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = crate::attendance::CheckinResult),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn manual_attendance(
    auth: AuthUser,
    service: web::Data<CheckinSvc>,
    payload: web::Json<ManualAttendance>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let now = Local::now().naive_local();
    let result = service
        .record(
            payload.user_id,
            Some(payload.kind),
            AttendanceMethod::Manual,
            None,
            now,
        )
        .await?;

    tracing::info!(
        admin_id = auth.user_id,
        user_id = payload.user_id,
        kind = %payload.kind,
        "Manual attendance entry"
    );

    Ok(HttpResponse::Ok().json(result))
}
