use crate::auth::auth::AuthUser;
use crate::store::MySqlStore;
use crate::swap::marketplace::Marketplace;
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;

pub type MarketplaceSvc = Marketplace<MySqlStore>;

#[derive(Deserialize, ToSchema)]
pub struct CreateSwap {
    #[schema(example = 12)]
    pub shift_id: u64,
    #[schema(example = "Family event")]
    pub reason: Option<String>,
}

/* =========================
Open requests
========================= */
#[utoipa::path(
    get,
    path = "/api/swaps",
    responses(
        (status = 200, description = "Open offers from colleagues, earliest shift first", body = [crate::model::shift_swap::OpenSwap]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Shift Swap"
)]
pub async fn list_swaps(
    auth: AuthUser,
    market: web::Data<MarketplaceSvc>,
) -> actix_web::Result<HttpResponse> {
    let now = Local::now().naive_local();
    let open = market.list_open(auth.user_id, now).await?;
    Ok(HttpResponse::Ok().json(open))
}

/* =========================
Offer a shift
========================= */
#[utoipa::path(
    post,
    path = "/api/swaps",
    request_body = CreateSwap,
    responses(
        (status = 201, description = "Request opened", body = crate::model::shift_swap::ShiftSwapRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your shift"),
        (status = 404, description = "Shift not found"),
        (status = 409, description = "Shift already started or already offered"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Shift Swap"
)]
pub async fn create_swap(
    auth: AuthUser,
    market: web::Data<MarketplaceSvc>,
    payload: web::Json<CreateSwap>,
) -> actix_web::Result<HttpResponse> {
    let CreateSwap { shift_id, reason } = payload.into_inner();
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let now = Local::now().naive_local();
    let swap = market.create(auth.user_id, shift_id, reason, now).await?;
    Ok(HttpResponse::Created().json(swap))
}

#[utoipa::path(
    get,
    path = "/api/swaps/{id}",
    params(
        ("id" = u64, Path, description = "Swap request id")
    ),
    responses(
        (status = 200, description = "Swap request", body = crate::model::shift_swap::ShiftSwapRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Shift Swap"
)]
pub async fn get_swap(
    _auth: AuthUser,
    market: web::Data<MarketplaceSvc>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let swap = market.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(swap))
}

/* =========================
Claim (first wins)
========================= */
#[utoipa::path(
    post,
    path = "/api/swaps/{id}/claim",
    params(
        ("id" = u64, Path, description = "Swap request id")
    ),
    responses(
        (status = 200, description = "Claimed, waiting for admin approval", body = crate::model::shift_swap::ShiftSwapRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot claim your own shift"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already claimed, no longer open, or overlapping shift", body = Object, example = json!({
            "error": "conflict",
            "message": "This shift has already been claimed"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Shift Swap"
)]
#[instrument(name = "swap_claim", skip_all, fields(claimant = auth.user_id, swap_id = *path))]
pub async fn claim_swap(
    auth: AuthUser,
    market: web::Data<MarketplaceSvc>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let now = Local::now().naive_local();
    let swap = market.claim(path.into_inner(), auth.user_id, now).await?;
    Ok(HttpResponse::Ok().json(swap))
}

/* =========================
Admin decision
========================= */
#[utoipa::path(
    put,
    path = "/api/swaps/{id}/approve",
    params(
        ("id" = u64, Path, description = "Swap request id")
    ),
    responses(
        (status = 200, description = "Approved; shift reassigned to the claimant", body = crate::model::shift_swap::ShiftSwapRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not pending approval, or the claimant already has an overlapping shift")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Shift Swap"
)]
pub async fn approve_swap(
    auth: AuthUser,
    market: web::Data<MarketplaceSvc>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let now = Local::now().naive_local();
    let swap = market.approve(auth.actor(), path.into_inner(), now).await?;
    Ok(HttpResponse::Ok().json(swap))
}

#[utoipa::path(
    put,
    path = "/api/swaps/{id}/reject",
    params(
        ("id" = u64, Path, description = "Swap request id")
    ),
    responses(
        (status = 200, description = "Rejected", body = crate::model::shift_swap::ShiftSwapRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not pending approval")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Shift Swap"
)]
pub async fn reject_swap(
    auth: AuthUser,
    market: web::Data<MarketplaceSvc>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let now = Local::now().naive_local();
    let swap = market.reject(auth.actor(), path.into_inner(), now).await?;
    Ok(HttpResponse::Ok().json(swap))
}

/* =========================
Withdraw
========================= */
#[utoipa::path(
    delete,
    path = "/api/swaps/{id}",
    params(
        ("id" = u64, Path, description = "Swap request id")
    ),
    responses(
        (status = 200, description = "Withdrawn", body = crate::model::shift_swap::ShiftSwapRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already claimed or closed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Shift Swap"
)]
pub async fn cancel_swap(
    auth: AuthUser,
    market: web::Data<MarketplaceSvc>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let now = Local::now().naive_local();
    let swap = market.cancel(auth.user_id, path.into_inner(), now).await?;
    Ok(HttpResponse::Ok().json(swap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_reason_is_optional() {
        let body: CreateSwap =
            serde_json::from_value(serde_json::json!({ "shift_id": 3 })).unwrap();
        assert_eq!(body.shift_id, 3);
        assert!(body.reason.is_none());
    }
}
