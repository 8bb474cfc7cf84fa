use chrono::NaiveDateTime;
use tracing::info;

use crate::error::AppError;
use crate::model::{
    shift::Shift,
    shift_swap::{OpenSwap, ShiftSwapRequest, SwapStatus},
    user::Actor,
};
use crate::store::{Approval, SwapStore};

/// Shift give-away board: owners offer shifts, colleagues claim them, admins decide.
pub struct Marketplace<S> {
    store: S,
}

fn not_found() -> AppError {
    AppError::NotFound("Swap request not found".to_string())
}

fn unavailable(status: SwapStatus) -> AppError {
    match status {
        SwapStatus::PendingApproval => {
            AppError::Conflict("This shift has already been claimed".to_string())
        }
        other => AppError::Conflict(format!(
            "This request is no longer available (status {other})"
        )),
    }
}

impl<S: SwapStore> Marketplace<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn shift(&self, id: u64) -> Result<Shift, AppError> {
        self.store
            .find_shift(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))
    }

    pub async fn get(&self, id: u64) -> Result<ShiftSwapRequest, AppError> {
        self.store.find_swap(id).await?.ok_or_else(not_found)
    }

    /// Puts one of the requester's own, not yet started shifts on the board.
    pub async fn create(
        &self,
        requester_id: u64,
        shift_id: u64,
        reason: Option<String>,
        now: NaiveDateTime,
    ) -> Result<ShiftSwapRequest, AppError> {
        let shift = self.shift(shift_id).await?;

        if shift.user_id != requester_id {
            return Err(AppError::Forbidden(
                "You can only offer your own shifts".to_string(),
            ));
        }
        if shift.start_time <= now {
            return Err(AppError::Conflict(
                "This shift has already started".to_string(),
            ));
        }

        let id = self
            .store
            .insert_swap(requester_id, shift_id, reason, now)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("This shift is already on the marketplace".to_string())
            })?;

        info!(swap_id = id, requester_id, shift_id, "Swap request opened");
        self.get(id).await
    }

    /// OPEN requests from other people whose shift is still ahead.
    pub async fn list_open(
        &self,
        viewer_id: u64,
        now: NaiveDateTime,
    ) -> Result<Vec<OpenSwap>, AppError> {
        Ok(self.store.list_open_swaps(viewer_id, now).await?)
    }

    /// First claimant wins; everyone after gets a conflict.
    pub async fn claim(
        &self,
        id: u64,
        claimant_id: u64,
        now: NaiveDateTime,
    ) -> Result<ShiftSwapRequest, AppError> {
        let swap = self.get(id).await?;

        if swap.requester_id == claimant_id {
            return Err(AppError::Forbidden(
                "You cannot claim your own shift".to_string(),
            ));
        }
        if swap.status != SwapStatus::Open {
            return Err(unavailable(swap.status));
        }

        let shift = self.shift(swap.shift_id).await?;
        if shift.start_time <= now {
            return Err(AppError::Conflict(
                "This shift has already started and is no longer available".to_string(),
            ));
        }
        if self
            .store
            .has_overlapping_shift(claimant_id, shift.start_time, shift.end_time)
            .await?
        {
            return Err(AppError::Conflict(
                "You already have or have claimed a shift overlapping this one".to_string(),
            ));
        }

        if !self.store.claim_swap(id, claimant_id, now).await? {
            info!(swap_id = id, claimant_id, "Claim lost the race");
            return Err(AppError::Conflict(
                "This shift has already been claimed".to_string(),
            ));
        }

        info!(swap_id = id, claimant_id, "Swap request claimed");
        Ok(ShiftSwapRequest {
            status: SwapStatus::PendingApproval,
            claimant_id: Some(claimant_id),
            ..swap
        })
    }

    /// Admin only. Hands the shift to the claimant.
    pub async fn approve(
        &self,
        approver: Actor,
        id: u64,
        now: NaiveDateTime,
    ) -> Result<ShiftSwapRequest, AppError> {
        require_admin(approver)?;

        match self.store.approve_swap(id, now).await? {
            Approval::Approved => {}
            Approval::NotPending => return Err(self.transition_failure(id).await),
            Approval::Overlapping => {
                info!(swap_id = id, approver_id = approver.id, "Approval would double-book the claimant");
                return Err(AppError::Conflict(
                    "The claimant already has a shift overlapping this one".to_string(),
                ));
            }
        }

        info!(swap_id = id, approver_id = approver.id, "Swap approved");
        self.get(id).await
    }

    /// Admin only. Rejection is final; the requester can post the shift again.
    pub async fn reject(
        &self,
        approver: Actor,
        id: u64,
        now: NaiveDateTime,
    ) -> Result<ShiftSwapRequest, AppError> {
        require_admin(approver)?;

        if !self.store.reject_swap(id, now).await? {
            return Err(self.transition_failure(id).await);
        }

        info!(swap_id = id, approver_id = approver.id, "Swap rejected");
        self.get(id).await
    }

    /// Requester withdraws an unclaimed offer.
    pub async fn cancel(
        &self,
        requester_id: u64,
        id: u64,
        now: NaiveDateTime,
    ) -> Result<ShiftSwapRequest, AppError> {
        let swap = self.get(id).await?;
        if swap.requester_id != requester_id {
            return Err(AppError::Forbidden(
                "Only the requester can withdraw this offer".to_string(),
            ));
        }

        if !self.store.cancel_swap(id, requester_id, now).await? {
            return Err(self.transition_failure(id).await);
        }

        info!(swap_id = id, requester_id, "Swap request cancelled");
        self.get(id).await
    }

    async fn transition_failure(&self, id: u64) -> AppError {
        match self.store.find_swap(id).await {
            Ok(Some(swap)) => unavailable(swap.status),
            Ok(None) => not_found(),
            Err(e) => AppError::from(e),
        }
    }
}

fn require_admin(actor: Actor) -> Result<(), AppError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin only".to_string()))
    }
}
