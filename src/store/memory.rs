use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use super::{Approval, AttendanceStore, NewAttendance, SwapStore};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceType},
    company_settings::CompanySettings,
    role::Role,
    shift::Shift,
    shift_swap::{OpenSwap, ShiftSwapRequest, SwapStatus},
    user::User,
};

#[derive(Default)]
struct State {
    users: HashMap<u64, User>,
    shifts: HashMap<u64, Shift>,
    records: Vec<AttendanceRecord>,
    swaps: HashMap<u64, ShiftSwapRequest>,
    settings: Option<CompanySettings>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Single-mutex store for tests; each trait call is one critical section.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: u64, name: &str, role: Role) {
        let mut state = self.state.lock().unwrap();
        state.users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                role,
                phone: None,
                last_location: None,
                last_location_at: None,
            },
        );
    }

    pub fn add_shift(&self, user_id: u64, start: NaiveDateTime, end: NaiveDateTime) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.shifts.insert(
            id,
            Shift {
                id,
                user_id,
                start_time: start,
                end_time: end,
                shift_type: "REGULAR".to_string(),
                status: "SCHEDULED".to_string(),
            },
        );
        id
    }

    pub fn set_shift_status(&self, id: u64, status: &str) {
        if let Some(shift) = self.state.lock().unwrap().shifts.get_mut(&id) {
            shift.status = status.to_string();
        }
    }

    pub fn set_settings(&self, settings: Option<CompanySettings>) {
        self.state.lock().unwrap().settings = settings;
    }

    pub fn user(&self, id: u64) -> Option<User> {
        self.state.lock().unwrap().users.get(&id).cloned()
    }

    pub fn shift(&self, id: u64) -> Option<Shift> {
        self.state.lock().unwrap().shifts.get(&id).cloned()
    }

    pub fn records_for(&self, user_id: u64) -> Vec<AttendanceRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl AttendanceStore for MemoryStore {
    async fn find_user(&self, id: u64) -> Result<Option<User>, sqlx::Error> {
        let user = self.user(id);
        // concurrent scans for one identity reach append_attendance interleaved
        actix_web::rt::task::yield_now().await;
        Ok(user)
    }

    async fn company_settings(&self) -> Result<Option<CompanySettings>, sqlx::Error> {
        Ok(self.state.lock().unwrap().settings.clone())
    }

    async fn first_shift_on(
        &self,
        user_id: u64,
        day: NaiveDate,
    ) -> Result<Option<Shift>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .shifts
            .values()
            .filter(|s| s.user_id == user_id && s.start_time.date() == day)
            .min_by_key(|s| s.start_time)
            .cloned())
    }

    async fn append_attendance(
        &self,
        entry: NewAttendance,
    ) -> Result<AttendanceRecord, sqlx::Error> {
        let mut state = self.state.lock().unwrap();

        if !state.users.contains_key(&entry.user_id) {
            return Err(sqlx::Error::RowNotFound);
        }

        let last = state
            .records
            .iter()
            .rev()
            .find(|r| r.user_id == entry.user_id)
            .map(|r| r.kind);
        let kind = entry
            .forced
            .unwrap_or_else(|| AttendanceType::next_after(last));

        let record = AttendanceRecord {
            id: state.next_id(),
            user_id: entry.user_id,
            kind,
            method: entry.method,
            recorded_at: entry.at,
            is_late: kind == AttendanceType::CheckIn && entry.late_if_check_in,
        };
        state.records.push(record.clone());

        if let (Some(loc), Some(user)) = (entry.location, state.users.get_mut(&entry.user_id)) {
            user.last_location = Some(loc);
            user.last_location_at = Some(entry.at);
        }

        Ok(record)
    }

    async fn recent_attendance(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        let mut records = self.records_for(user_id);
        records.reverse();
        records.truncate(limit as usize);
        Ok(records)
    }
}

impl SwapStore for MemoryStore {
    async fn find_shift(&self, id: u64) -> Result<Option<Shift>, sqlx::Error> {
        Ok(self.shift(id))
    }

    async fn has_overlapping_shift(
        &self,
        user_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let claimed = |shift_id: u64| {
            state.swaps.values().any(|r| {
                r.shift_id == shift_id
                    && r.claimant_id == Some(user_id)
                    && r.status == SwapStatus::PendingApproval
            })
        };
        Ok(state.shifts.values().any(|s| {
            s.is_active() && s.overlaps(start, end) && (s.user_id == user_id || claimed(s.id))
        }))
    }

    async fn insert_swap(
        &self,
        requester_id: u64,
        shift_id: u64,
        reason: Option<String>,
        at: NaiveDateTime,
    ) -> Result<Option<u64>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();

        if !state.shifts.contains_key(&shift_id) {
            return Err(sqlx::Error::RowNotFound);
        }
        if state
            .swaps
            .values()
            .any(|s| s.shift_id == shift_id && s.status.is_active())
        {
            return Ok(None);
        }

        let id = state.next_id();
        state.swaps.insert(
            id,
            ShiftSwapRequest {
                id,
                requester_id,
                shift_id,
                status: SwapStatus::Open,
                claimant_id: None,
                reason,
                created_at: at,
            },
        );
        Ok(Some(id))
    }

    async fn find_swap(&self, id: u64) -> Result<Option<ShiftSwapRequest>, sqlx::Error> {
        let swap = self.state.lock().unwrap().swaps.get(&id).cloned();
        // let concurrent callers act on the same (possibly stale) read
        actix_web::rt::task::yield_now().await;
        Ok(swap)
    }

    async fn claim_swap(
        &self,
        id: u64,
        claimant_id: u64,
        _at: NaiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state.swaps.get_mut(&id) {
            Some(swap) if swap.status == SwapStatus::Open && swap.requester_id != claimant_id => {
                swap.status = SwapStatus::PendingApproval;
                swap.claimant_id = Some(claimant_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn approve_swap(&self, id: u64, _at: NaiveDateTime) -> Result<Approval, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let (shift_id, claimant_id) = match state.swaps.get(&id) {
            Some(ShiftSwapRequest {
                status: SwapStatus::PendingApproval,
                claimant_id: Some(claimant_id),
                shift_id,
                ..
            }) => (*shift_id, *claimant_id),
            _ => return Ok(Approval::NotPending),
        };

        let Some(target) = state.shifts.get(&shift_id).cloned() else {
            return Err(sqlx::Error::RowNotFound);
        };
        if state.shifts.values().any(|s| {
            s.id != shift_id
                && s.user_id == claimant_id
                && s.is_active()
                && s.overlaps(target.start_time, target.end_time)
        }) {
            return Ok(Approval::Overlapping);
        }

        if let Some(shift) = state.shifts.get_mut(&shift_id) {
            shift.user_id = claimant_id;
        }
        if let Some(swap) = state.swaps.get_mut(&id) {
            swap.status = SwapStatus::Approved;
        }
        Ok(Approval::Approved)
    }

    async fn reject_swap(&self, id: u64, _at: NaiveDateTime) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state.swaps.get_mut(&id) {
            Some(swap) if swap.status == SwapStatus::PendingApproval => {
                swap.status = SwapStatus::Rejected;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_swap(
        &self,
        id: u64,
        requester_id: u64,
        _at: NaiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state.swaps.get_mut(&id) {
            Some(swap) if swap.status == SwapStatus::Open && swap.requester_id == requester_id => {
                swap.status = SwapStatus::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_open_swaps(
        &self,
        viewer_id: u64,
        now: NaiveDateTime,
    ) -> Result<Vec<OpenSwap>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut open: Vec<OpenSwap> = state
            .swaps
            .values()
            .filter(|s| s.status == SwapStatus::Open && s.requester_id != viewer_id)
            .filter_map(|s| {
                let shift = state.shifts.get(&s.shift_id)?;
                (shift.start_time > now).then(|| OpenSwap {
                    id: s.id,
                    requester_id: s.requester_id,
                    requester_name: state
                        .users
                        .get(&s.requester_id)
                        .map(|u| u.name.clone())
                        .unwrap_or_default(),
                    reason: s.reason.clone(),
                    shift: shift.clone(),
                })
            })
            .collect();
        open.sort_by_key(|o| o.shift.start_time);
        Ok(open)
    }
}
