use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::badges::BadgeHook;
use crate::config::Config;
use crate::model::attendance::AttendanceType;
use crate::qr::token::QrSigner;

pub mod recorder;
pub mod resolver;

#[derive(Debug, Clone)]
pub struct AttendancePolicy {
    /// Grace period after shift start before a check-in counts as late.
    pub late_tolerance: Duration,
    /// Radius used against the QR's own location when no office is configured.
    pub fallback_geofence_meters: f64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            late_tolerance: Duration::minutes(15),
            fallback_geofence_meters: 200.0,
        }
    }
}

impl From<&Config> for AttendancePolicy {
    fn from(config: &Config) -> Self {
        Self {
            late_tolerance: Duration::minutes(config.late_tolerance_minutes),
            fallback_geofence_meters: config.fallback_geofence_meters,
        }
    }
}

/// Scan resolution and attendance recording over a store.
pub struct CheckinService<S> {
    store: S,
    signer: QrSigner,
    policy: AttendancePolicy,
    badges: Arc<dyn BadgeHook>,
}

impl<S> CheckinService<S> {
    pub fn new(store: S, signer: QrSigner, policy: AttendancePolicy, badges: Arc<dyn BadgeHook>) -> Self {
        Self {
            store,
            signer,
            policy,
            badges,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// What the scanning device shows after a successful scan.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckinResult {
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "CHECK_IN")]
    pub event_type: AttendanceType,
    #[schema(example = false)]
    pub is_late: bool,
    #[schema(example = "Welcome, Jane Doe")]
    pub message: String,
    #[schema(example = "2026-01-01T09:05:00", format = "date-time", value_type = String)]
    pub recorded_at: NaiveDateTime,
}
