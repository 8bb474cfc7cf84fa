use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{FromRow, MySqlPool};

use super::{Approval, AttendanceStore, NewAttendance, SwapStore};
use crate::model::{
    attendance::{AttendanceMethod, AttendanceRecord, AttendanceType},
    company_settings::CompanySettings,
    role::Role,
    shift::{CANCELLED_STATUS, Shift},
    shift_swap::{OpenSwap, ShiftSwapRequest, SwapStatus},
    user::User,
};
use crate::utils::{geo::GeoPoint, settings_cache};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Upserts the singleton row and drops the cached copy.
    pub async fn save_company_settings(&self, settings: &CompanySettings) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO company_settings (id, office_lat, office_lng, geofence_radius)
            VALUES (1, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                office_lat = VALUES(office_lat),
                office_lng = VALUES(office_lng),
                geofence_radius = VALUES(geofence_radius)
            "#,
        )
        .bind(settings.office_lat)
        .bind(settings.office_lng)
        .bind(settings.geofence_radius)
        .execute(&self.pool)
        .await?;

        settings_cache::invalidate().await;
        Ok(())
    }
}

fn decode_enum<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = strum::ParseError>,
{
    T::from_str(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    role: String,
    phone: Option<String>,
    last_lat: Option<f64>,
    last_lng: Option<f64>,
    last_location_at: Option<NaiveDateTime>,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let last_location = match (row.last_lat, row.last_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };

        Ok(User {
            id: row.id,
            name: row.name,
            role: decode_enum::<Role>(&row.role)?,
            phone: row.phone,
            last_location,
            last_location_at: row.last_location_at,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    kind: String,
    method: String,
    recorded_at: NaiveDateTime,
    is_late: bool,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = sqlx::Error;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            kind: decode_enum::<AttendanceType>(&row.kind)?,
            method: decode_enum::<AttendanceMethod>(&row.method)?,
            recorded_at: row.recorded_at,
            is_late: row.is_late,
        })
    }
}

#[derive(FromRow)]
struct SwapRow {
    id: u64,
    requester_id: u64,
    shift_id: u64,
    status: String,
    claimant_id: Option<u64>,
    reason: Option<String>,
    created_at: NaiveDateTime,
}

impl TryFrom<SwapRow> for ShiftSwapRequest {
    type Error = sqlx::Error;

    fn try_from(row: SwapRow) -> Result<Self, Self::Error> {
        Ok(ShiftSwapRequest {
            id: row.id,
            requester_id: row.requester_id,
            shift_id: row.shift_id,
            status: decode_enum::<SwapStatus>(&row.status)?,
            claimant_id: row.claimant_id,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct OpenSwapRow {
    id: u64,
    requester_id: u64,
    requester_name: String,
    reason: Option<String>,
    shift_id: u64,
    shift_user_id: u64,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    shift_type: String,
    shift_status: String,
}

impl From<OpenSwapRow> for OpenSwap {
    fn from(row: OpenSwapRow) -> Self {
        OpenSwap {
            id: row.id,
            requester_id: row.requester_id,
            requester_name: row.requester_name,
            reason: row.reason,
            shift: Shift {
                id: row.shift_id,
                user_id: row.shift_user_id,
                start_time: row.start_time,
                end_time: row.end_time,
                shift_type: row.shift_type,
                status: row.shift_status,
            },
        }
    }
}

const SHIFT_COLUMNS: &str = "id, user_id, start_time, end_time, shift_type, status";
const SWAP_COLUMNS: &str = "id, requester_id, shift_id, status, claimant_id, reason, created_at";

impl AttendanceStore for MySqlStore {
    async fn find_user(&self, id: u64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, role, phone, last_lat, last_lng, last_location_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn company_settings(&self) -> Result<Option<CompanySettings>, sqlx::Error> {
        if let Some(cached) = settings_cache::get().await {
            return Ok(cached);
        }

        let settings = sqlx::query_as::<_, CompanySettings>(
            r#"
            SELECT office_lat, office_lng, geofence_radius
            FROM company_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        settings_cache::put(settings.clone()).await;
        Ok(settings)
    }

    async fn first_shift_on(
        &self,
        user_id: u64,
        day: NaiveDate,
    ) -> Result<Option<Shift>, sqlx::Error> {
        let day_start = day.and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM shifts
            WHERE user_id = ?
            AND start_time >= ?
            AND start_time < ?
            ORDER BY start_time
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_optional(&self.pool)
        .await
    }

    async fn append_attendance(
        &self,
        entry: NewAttendance,
    ) -> Result<AttendanceRecord, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the identity serializes concurrent scans for the same person
        sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ? FOR UPDATE")
            .bind(entry.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let last = sqlx::query_scalar::<_, String>(
            r#"
            SELECT kind
            FROM attendance_records
            WHERE user_id = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(entry.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|k| decode_enum::<AttendanceType>(&k))
        .transpose()?;

        let kind = entry
            .forced
            .unwrap_or_else(|| AttendanceType::next_after(last));
        let is_late = kind == AttendanceType::CheckIn && entry.late_if_check_in;

        let inserted = sqlx::query(
            r#"
            INSERT INTO attendance_records (user_id, kind, method, recorded_at, is_late)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id)
        .bind(kind.as_ref())
        .bind(entry.method.as_ref())
        .bind(entry.at)
        .bind(is_late)
        .execute(&mut *tx)
        .await?;

        if let Some(loc) = entry.location {
            sqlx::query(
                r#"
                UPDATE users
                SET last_lat = ?, last_lng = ?, last_location_at = ?
                WHERE id = ?
                "#,
            )
            .bind(loc.lat)
            .bind(loc.lng)
            .bind(entry.at)
            .bind(entry.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(AttendanceRecord {
            id: inserted.last_insert_id(),
            user_id: entry.user_id,
            kind,
            method: entry.method,
            recorded_at: entry.at,
            is_late,
        })
    }

    async fn recent_attendance(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, user_id, kind, method, recorded_at, is_late
            FROM attendance_records
            WHERE user_id = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AttendanceRecord::try_from)
        .collect()
    }
}

impl SwapStore for MySqlStore {
    async fn find_shift(&self, id: u64) -> Result<Option<Shift>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn has_overlapping_shift(
        &self,
        user_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM shifts s
            WHERE s.start_time < ?
            AND s.end_time > ?
            AND s.status <> ?
            AND (
                s.user_id = ?
                OR EXISTS (
                    SELECT 1
                    FROM shift_swap_requests r
                    WHERE r.shift_id = s.id
                    AND r.claimant_id = ?
                    AND r.status = 'PENDING_APPROVAL'
                )
            )
            "#,
        )
        .bind(end)
        .bind(start)
        .bind(CANCELLED_STATUS)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn insert_swap(
        &self,
        requester_id: u64,
        shift_id: u64,
        reason: Option<String>,
        at: NaiveDateTime,
    ) -> Result<Option<u64>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Lock the shift so two offers for it cannot interleave
        sqlx::query_scalar::<_, u64>("SELECT id FROM shifts WHERE id = ? FOR UPDATE")
            .bind(shift_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let active = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM shift_swap_requests
            WHERE shift_id = ?
            AND status IN ('OPEN', 'PENDING_APPROVAL')
            "#,
        )
        .bind(shift_id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            return Ok(None);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO shift_swap_requests
                (requester_id, shift_id, status, reason, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(requester_id)
        .bind(shift_id)
        .bind(SwapStatus::Open.as_ref())
        .bind(reason)
        .bind(at)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(result.last_insert_id()))
    }

    async fn find_swap(&self, id: u64) -> Result<Option<ShiftSwapRequest>, sqlx::Error> {
        sqlx::query_as::<_, SwapRow>(&format!(
            "SELECT {SWAP_COLUMNS} FROM shift_swap_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(ShiftSwapRequest::try_from)
        .transpose()
    }

    async fn claim_swap(
        &self,
        id: u64,
        claimant_id: u64,
        at: NaiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE shift_swap_requests
            SET status = 'PENDING_APPROVAL', claimant_id = ?, updated_at = ?
            WHERE id = ?
            AND status = 'OPEN'
            AND requester_id <> ?
            "#,
        )
        .bind(claimant_id)
        .bind(at)
        .bind(id)
        .bind(claimant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn approve_swap(&self, id: u64, at: NaiveDateTime) -> Result<Approval, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SwapRow>(&format!(
            "SELECT {SWAP_COLUMNS} FROM shift_swap_requests WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(swap) = row.map(ShiftSwapRequest::try_from).transpose()? else {
            return Ok(Approval::NotPending);
        };
        let (SwapStatus::PendingApproval, Some(claimant_id)) = (swap.status, swap.claimant_id)
        else {
            return Ok(Approval::NotPending);
        };

        // Lock the claimant's row so two approvals for them cannot both pass the check
        sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ? FOR UPDATE")
            .bind(claimant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let overlapping = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM shifts mine
            JOIN shifts target ON target.id = ?
            WHERE mine.user_id = ?
            AND mine.id <> target.id
            AND mine.status <> ?
            AND mine.start_time < target.end_time
            AND mine.end_time > target.start_time
            "#,
        )
        .bind(swap.shift_id)
        .bind(claimant_id)
        .bind(CANCELLED_STATUS)
        .fetch_one(&mut *tx)
        .await?;

        if overlapping > 0 {
            return Ok(Approval::Overlapping);
        }

        sqlx::query("UPDATE shifts SET user_id = ? WHERE id = ?")
            .bind(claimant_id)
            .bind(swap.shift_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE shift_swap_requests
            SET status = 'APPROVED', updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Approval::Approved)
    }

    async fn reject_swap(&self, id: u64, at: NaiveDateTime) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE shift_swap_requests
            SET status = 'REJECTED', updated_at = ?
            WHERE id = ?
            AND status = 'PENDING_APPROVAL'
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel_swap(
        &self,
        id: u64,
        requester_id: u64,
        at: NaiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE shift_swap_requests
            SET status = 'CANCELLED', updated_at = ?
            WHERE id = ?
            AND requester_id = ?
            AND status = 'OPEN'
            "#,
        )
        .bind(at)
        .bind(id)
        .bind(requester_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_open_swaps(
        &self,
        viewer_id: u64,
        now: NaiveDateTime,
    ) -> Result<Vec<OpenSwap>, sqlx::Error> {
        let rows = sqlx::query_as::<_, OpenSwapRow>(
            r#"
            SELECT
                r.id,
                r.requester_id,
                u.name AS requester_name,
                r.reason,
                s.id AS shift_id,
                s.user_id AS shift_user_id,
                s.start_time,
                s.end_time,
                s.shift_type,
                s.status AS shift_status
            FROM shift_swap_requests r
            JOIN shifts s ON s.id = r.shift_id
            JOIN users u ON u.id = r.requester_id
            WHERE r.status = 'OPEN'
            AND r.requester_id <> ?
            AND s.start_time > ?
            ORDER BY s.start_time
            "#,
        )
        .bind(viewer_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OpenSwap::from).collect())
    }
}
