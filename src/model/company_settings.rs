use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::utils::geo::GeoPoint;

/// Singleton row; `geofence_radius == 0` turns enforcement off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompanySettings {
    #[schema(example = 23.8103)]
    pub office_lat: f64,
    #[schema(example = 90.4125)]
    pub office_lng: f64,
    /// meters
    #[schema(example = 100.0)]
    pub geofence_radius: f64,
}

impl CompanySettings {
    pub fn office(&self) -> GeoPoint {
        GeoPoint::new(self.office_lat, self.office_lng)
    }

    pub fn enforces_geofence(&self) -> bool {
        self.geofence_radius > 0.0
    }
}
