use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceType {
    CheckIn,
    CheckOut,
}

impl AttendanceType {
    /// The event that follows `last` in the in/out toggle.
    pub fn next_after(last: Option<AttendanceType>) -> AttendanceType {
        match ClockState::from_last(last) {
            ClockState::CheckedIn => AttendanceType::CheckOut,
            ClockState::CheckedOut => AttendanceType::CheckIn,
        }
    }
}

/// Presence derived from the most recent record; there is no stored flag.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClockState {
    CheckedIn,
    CheckedOut,
}

impl ClockState {
    pub fn from_last(last: Option<AttendanceType>) -> Self {
        match last {
            Some(AttendanceType::CheckIn) => ClockState::CheckedIn,
            Some(AttendanceType::CheckOut) | None => ClockState::CheckedOut,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceMethod {
    Qr,
    Manual,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "CHECK_IN")]
    pub kind: AttendanceType,
    #[schema(example = "QR")]
    pub method: AttendanceMethod,
    #[schema(example = "2026-01-01T09:05:00", format = "date-time", value_type = String)]
    pub recorded_at: NaiveDateTime,
    #[schema(example = false)]
    pub is_late: bool,
}
