use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::{CheckinResult, CheckinService};
use crate::error::AppError;
use crate::model::{
    attendance::AttendanceMethod, company_settings::CompanySettings, role::Role, user::Actor,
};
use crate::qr::token::QrSigner;
use crate::store::AttendanceStore;
use crate::utils::geo::GeoPoint;

/// Unsigned badge format printed before badges carried signed tokens.
pub const LEGACY_USER_PREFIX: &str = "USER:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// `USER:<id>`
    LegacyUser(u64),
    /// Verified USER_QR token
    SignedUser(u64),
    /// Anything else; only valid if it verifies as an OFFICE_QR token.
    OfficeCandidate,
}

/// First match wins: legacy prefix, signed badge, then office.
pub fn classify(signer: &QrSigner, raw: &str) -> ScanKind {
    let raw = raw.trim();

    if let Some(id) = raw
        .strip_prefix(LEGACY_USER_PREFIX)
        .and_then(|rest| rest.trim().parse::<u64>().ok())
    {
        return ScanKind::LegacyUser(id);
    }

    if let Some(user_id) = signer.verify_user(raw) {
        return ScanKind::SignedUser(user_id);
    }

    ScanKind::OfficeCandidate
}

/// Checks `reported` against, in order: the configured office and radius, the
/// location baked into the office token (only when no settings row exists),
/// or nothing at all.
pub fn check_geofence(
    settings: Option<&CompanySettings>,
    token_location: Option<GeoPoint>,
    reported: Option<GeoPoint>,
    fallback_radius: f64,
) -> Result<(), AppError> {
    match (settings, token_location, reported) {
        (Some(s), _, _) if s.enforces_geofence() => {
            let reported = reported.ok_or(AppError::LocationRequired)?;
            let distance = reported.distance_to(&s.office());
            if distance > s.geofence_radius {
                return Err(AppError::OutsideGeofence {
                    distance,
                    allowed: s.geofence_radius,
                });
            }
            Ok(())
        }
        (None, Some(issued_at), Some(reported)) => {
            let distance = reported.distance_to(&issued_at);
            if distance > fallback_radius {
                return Err(AppError::OutsideGeofence {
                    distance,
                    allowed: fallback_radius,
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

impl<S: AttendanceStore> CheckinService<S> {
    /// Works out who is being checked in from a raw QR string and records it.
    pub async fn resolve(
        &self,
        actor: Option<Actor>,
        raw: &str,
        reported: Option<GeoPoint>,
        now: NaiveDateTime,
    ) -> Result<CheckinResult, AppError> {
        let kind = classify(&self.signer, raw);
        debug!(?kind, actor = ?actor.map(|a| a.id), "Scan classified");

        let target_id = match kind {
            ScanKind::LegacyUser(scanned_id) | ScanKind::SignedUser(scanned_id) => {
                self.badge_target(actor, scanned_id).await?
            }
            ScanKind::OfficeCandidate => self.office_target(actor, raw, reported).await?,
        };

        self.record(target_id, None, AttendanceMethod::Qr, reported, now)
            .await
    }

    /// An admin's badge checks in whoever scans it; anyone else's badge must
    /// be scanned by an admin.
    async fn badge_target(&self, actor: Option<Actor>, scanned_id: u64) -> Result<u64, AppError> {
        let scanned = self
            .store
            .find_user(scanned_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Scanned user not found".to_string()))?;

        let actor = actor.ok_or(AppError::AuthenticationRequired)?;

        if scanned.role == Role::Admin {
            return Ok(actor.id);
        }

        if !actor.is_admin() {
            info!(actor_id = actor.id, scanned_id, "Non-admin scanned another badge");
            return Err(AppError::Forbidden(
                "Only an admin can scan another employee's badge".to_string(),
            ));
        }

        Ok(scanned.id)
    }

    async fn office_target(
        &self,
        actor: Option<Actor>,
        raw: &str,
        reported: Option<GeoPoint>,
    ) -> Result<u64, AppError> {
        let actor = actor.ok_or(AppError::AuthenticationRequired)?;

        let token_location = self
            .signer
            .verify_office(raw.trim())
            .ok_or(AppError::InvalidToken)?;

        let settings = self.store.company_settings().await?;

        if let Err(e) = check_geofence(
            settings.as_ref(),
            token_location,
            reported,
            self.policy.fallback_geofence_meters,
        ) {
            info!(actor_id = actor.id, error = %e, "Office scan rejected by geofence");
            return Err(e);
        }

        Ok(actor.id)
    }
}
