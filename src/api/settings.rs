use crate::api::attendance::CheckinSvc;
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::company_settings::CompanySettings;
use crate::store::AttendanceStore;
use crate::utils::geo::GeoPoint;
use actix_web::{HttpResponse, web};

fn validate_settings(settings: &CompanySettings) -> Result<(), AppError> {
    if !settings.office().is_valid() {
        return Err(AppError::BadRequest("Invalid office coordinates".to_string()));
    }
    if !settings.geofence_radius.is_finite() || settings.geofence_radius < 0.0 {
        return Err(AppError::BadRequest(
            "geofence_radius must be zero or positive".to_string(),
        ));
    }
    Ok(())
}

/// Office location and geofence radius
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Current settings", body = CompanySettings),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not configured yet"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    _auth: AuthUser,
    service: web::Data<CheckinSvc>,
) -> actix_web::Result<HttpResponse> {
    let settings = service
        .store()
        .company_settings()
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Company settings not configured".to_string()))?;

    Ok(HttpResponse::Ok().json(settings))
}

/// Replace the office location and geofence radius (0 disables the geofence)
#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = CompanySettings,
    responses(
        (status = 200, description = "Settings saved", body = CompanySettings),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    auth: AuthUser,
    service: web::Data<CheckinSvc>,
    payload: web::Json<CompanySettings>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let settings = payload.into_inner();
    validate_settings(&settings)?;

    service
        .store()
        .save_company_settings(&settings)
        .await
        .map_err(AppError::from)?;

    tracing::info!(
        admin_id = auth.user_id,
        office = ?GeoPoint::new(settings.office_lat, settings.office_lng),
        radius = settings.geofence_radius,
        "Company settings updated"
    );

    Ok(HttpResponse::Ok().json(settings))
}
