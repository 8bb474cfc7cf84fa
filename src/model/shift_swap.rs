use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// OPEN -> PENDING_APPROVAL -> APPROVED | REJECTED; OPEN -> CANCELLED
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    Open,
    PendingApproval,
    Approved,
    Rejected,
    Cancelled,
}

impl SwapStatus {
    /// Still occupying its shift in the marketplace.
    pub fn is_active(self) -> bool {
        matches!(self, SwapStatus::Open | SwapStatus::PendingApproval)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShiftSwapRequest {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 1000)]
    pub requester_id: u64,
    #[schema(example = 12)]
    pub shift_id: u64,
    #[schema(example = "OPEN")]
    pub status: SwapStatus,
    #[schema(example = 1001, nullable = true)]
    pub claimant_id: Option<u64>,
    #[schema(example = "Family event", nullable = true)]
    pub reason: Option<String>,
    #[schema(example = "2026-01-01T08:00:00", format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
}

/// Marketplace listing row: the request plus the shift on offer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OpenSwap {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 1000)]
    pub requester_id: u64,
    #[schema(example = "Jane Doe")]
    pub requester_name: String,
    #[schema(example = "Family event", nullable = true)]
    pub reason: Option<String>,
    pub shift: super::shift::Shift,
}
