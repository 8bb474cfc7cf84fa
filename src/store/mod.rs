//! Storage seam for the attendance and marketplace services.
//!
//! The MySQL implementation backs the HTTP handlers; the in-memory one backs
//! the unit tests. Every method that changes state is atomic with respect to
//! the rows it reads (see the individual docs).

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{
    attendance::{AttendanceMethod, AttendanceRecord, AttendanceType},
    company_settings::CompanySettings,
    shift::Shift,
    shift_swap::{OpenSwap, ShiftSwapRequest},
    user::User,
};
use crate::utils::geo::GeoPoint;

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

/// Attendance event to append for one identity.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    /// Skip the in/out toggle and record this type.
    pub forced: Option<AttendanceType>,
    pub method: AttendanceMethod,
    pub at: NaiveDateTime,
    /// Whether a CHECK_IN at `at` counts as late.
    pub late_if_check_in: bool,
    pub location: Option<GeoPoint>,
}

#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    async fn find_user(&self, id: u64) -> Result<Option<User>, sqlx::Error>;

    async fn company_settings(&self) -> Result<Option<CompanySettings>, sqlx::Error>;

    /// Earliest shift of `user_id` starting on `day` (local midnight to midnight).
    async fn first_shift_on(&self, user_id: u64, day: NaiveDate)
    -> Result<Option<Shift>, sqlx::Error>;

    /// Derives the event type from the latest record, inserts the new record and
    /// updates the identity's last location, all under one per-identity lock.
    /// Fails with `RowNotFound` for an unknown identity.
    async fn append_attendance(&self, entry: NewAttendance)
    -> Result<AttendanceRecord, sqlx::Error>;

    async fn recent_attendance(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error>;
}

/// Outcome of [`SwapStore::approve_swap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    NotPending,
    /// The claimant would end up owning two overlapping shifts.
    Overlapping,
}

#[allow(async_fn_in_trait)]
pub trait SwapStore {
    async fn find_shift(&self, id: u64) -> Result<Option<Shift>, sqlx::Error>;

    /// Any non-cancelled shift intersecting `[start, end)` that `user_id`
    /// either owns or holds a PENDING_APPROVAL claim on.
    async fn has_overlapping_shift(
        &self,
        user_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, sqlx::Error>;

    /// `None` when the shift already has an OPEN or PENDING_APPROVAL request.
    async fn insert_swap(
        &self,
        requester_id: u64,
        shift_id: u64,
        reason: Option<String>,
        at: NaiveDateTime,
    ) -> Result<Option<u64>, sqlx::Error>;

    async fn find_swap(&self, id: u64) -> Result<Option<ShiftSwapRequest>, sqlx::Error>;

    /// OPEN -> PENDING_APPROVAL as one conditional update; `false` if the
    /// request was not OPEN or belongs to `claimant_id`.
    async fn claim_swap(
        &self,
        id: u64,
        claimant_id: u64,
        at: NaiveDateTime,
    ) -> Result<bool, sqlx::Error>;

    /// PENDING_APPROVAL -> APPROVED and hands the shift to the claimant, atomically.
    /// Refused when the claimant owns an overlapping shift by then.
    async fn approve_swap(&self, id: u64, at: NaiveDateTime) -> Result<Approval, sqlx::Error>;

    /// PENDING_APPROVAL -> REJECTED.
    async fn reject_swap(&self, id: u64, at: NaiveDateTime) -> Result<bool, sqlx::Error>;

    /// OPEN -> CANCELLED, only by the requester.
    async fn cancel_swap(
        &self,
        id: u64,
        requester_id: u64,
        at: NaiveDateTime,
    ) -> Result<bool, sqlx::Error>;

    /// OPEN requests not owned by `viewer_id` whose shift starts after `now`.
    async fn list_open_swaps(
        &self,
        viewer_id: u64,
        now: NaiveDateTime,
    ) -> Result<Vec<OpenSwap>, sqlx::Error>;
}
