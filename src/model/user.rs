use chrono::NaiveDateTime;
use serde::Serialize;

use super::role::Role;
use crate::utils::geo::GeoPoint;

/// Directory identity as seen by the attendance core.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub last_location: Option<GeoPoint>,
    pub last_location_at: Option<NaiveDateTime>,
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: u64,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
