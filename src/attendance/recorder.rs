use chrono::NaiveDateTime;
use tracing::info;

use super::{CheckinResult, CheckinService};
use crate::badges::BadgeEvent;
use crate::error::AppError;
use crate::model::attendance::{AttendanceMethod, AttendanceType};
use crate::store::{AttendanceStore, NewAttendance};
use crate::utils::geo::GeoPoint;

impl<S: AttendanceStore> CheckinService<S> {
    /// Appends the next attendance event for `target_id`.
    ///
    /// Without `forced`, the type toggles from the latest record (nothing on
    /// file means CHECK_IN). A CHECK_IN is late when `now` is past the start of
    /// that day's first shift plus the tolerance; no shift means never late.
    pub async fn record(
        &self,
        target_id: u64,
        forced: Option<AttendanceType>,
        method: AttendanceMethod,
        location: Option<GeoPoint>,
        now: NaiveDateTime,
    ) -> Result<CheckinResult, AppError> {
        let user = self
            .store
            .find_user(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let late_if_check_in = self
            .store
            .first_shift_on(target_id, now.date())
            .await?
            .map(|shift| now > shift.start_time + self.policy.late_tolerance)
            .unwrap_or(false);

        let record = self
            .store
            .append_attendance(NewAttendance {
                user_id: target_id,
                forced,
                method,
                at: now,
                late_if_check_in,
                location,
            })
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound("User not found".to_string()),
                e => AppError::from(e),
            })?;

        info!(
            user_id = target_id,
            kind = %record.kind,
            is_late = record.is_late,
            "Attendance recorded"
        );

        if record.kind == AttendanceType::CheckIn {
            self.badges.trigger(target_id, BadgeEvent::AttendanceCheckin);
        }

        Ok(CheckinResult {
            user_id: target_id,
            event_type: record.kind,
            is_late: record.is_late,
            message: greeting(&user.name, record.kind, record.is_late),
            recorded_at: record.recorded_at,
        })
    }
}

fn greeting(name: &str, kind: AttendanceType, is_late: bool) -> String {
    match (kind, is_late) {
        (AttendanceType::CheckIn, false) => format!("Welcome, {name}"),
        (AttendanceType::CheckIn, true) => format!("Welcome, {name} (late arrival)"),
        (AttendanceType::CheckOut, _) => format!("Goodbye, {name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::test_support::{at, service};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn first_scan_is_check_in() {
        let (svc, badges) = service();
        svc.store().add_user(1, "Jane", Role::Staff);

        let res = svc
            .record(1, None, AttendanceMethod::Qr, None, at(9, 0))
            .await
            .unwrap();

        assert_eq!(res.event_type, AttendanceType::CheckIn);
        assert!(!res.is_late);
        assert_eq!(res.message, "Welcome, Jane");
        assert_eq!(badges.calls(), vec![(1, BadgeEvent::AttendanceCheckin)]);
    }

    #[actix_web::test]
    async fn consecutive_scans_alternate() {
        let (svc, badges) = service();
        svc.store().add_user(1, "Jane", Role::Staff);

        let mut kinds = Vec::new();
        for minute in 0..5 {
            let res = svc
                .record(1, None, AttendanceMethod::Qr, None, at(9, minute))
                .await
                .unwrap();
            kinds.push(res.event_type);
        }

        use AttendanceType::*;
        assert_eq!(kinds, vec![CheckIn, CheckOut, CheckIn, CheckOut, CheckIn]);
        assert_eq!(svc.store().records_for(1).len(), 5);
        // hook fires on check-ins only
        assert_eq!(badges.calls().len(), 3);
    }

    #[actix_web::test]
    async fn simultaneous_scans_still_alternate() {
        let (svc, _) = service();
        svc.store().add_user(1, "Jane", Role::Staff);

        let (a, b) = futures::future::join(
            svc.record(1, None, AttendanceMethod::Qr, None, at(9, 0)),
            svc.record(1, None, AttendanceMethod::Qr, None, at(9, 0)),
        )
        .await;

        let mut kinds = vec![a.unwrap().event_type, b.unwrap().event_type];
        kinds.sort_by_key(|k| k.as_ref().to_string());
        assert_eq!(kinds, vec![AttendanceType::CheckIn, AttendanceType::CheckOut]);

        let stored: Vec<_> = svc.store().records_for(1).iter().map(|r| r.kind).collect();
        assert_eq!(stored, vec![AttendanceType::CheckIn, AttendanceType::CheckOut]);
    }

    #[actix_web::test]
    async fn check_out_says_goodbye() {
        let (svc, _) = service();
        svc.store().add_user(1, "Jane", Role::Staff);

        svc.record(1, None, AttendanceMethod::Qr, None, at(9, 0))
            .await
            .unwrap();
        let res = svc
            .record(1, None, AttendanceMethod::Qr, None, at(17, 0))
            .await
            .unwrap();

        assert_eq!(res.event_type, AttendanceType::CheckOut);
        assert_eq!(res.message, "Goodbye, Jane");
    }

    #[actix_web::test]
    async fn lateness_against_shift_start() {
        let (svc, _) = service();
        svc.store().add_user(1, "Jane", Role::Staff);
        svc.store().add_user(2, "Omar", Role::Staff);
        svc.store().add_shift(1, at(9, 0), at(17, 0));
        svc.store().add_shift(2, at(9, 0), at(17, 0));

        // exactly at the deadline is on time
        let on_time = svc
            .record(1, None, AttendanceMethod::Qr, None, at(9, 15))
            .await
            .unwrap();
        assert!(!on_time.is_late);

        let late = svc
            .record(2, None, AttendanceMethod::Qr, None, at(9, 16))
            .await
            .unwrap();
        assert!(late.is_late);
        assert_eq!(late.message, "Welcome, Omar (late arrival)");
        assert!(svc.store().records_for(2)[0].is_late);
    }

    #[actix_web::test]
    async fn no_shift_today_is_never_late() {
        let (svc, _) = service();
        svc.store().add_user(1, "Jane", Role::Staff);
        // yesterday's shift does not count
        svc.store()
            .add_shift(1, at(9, 0) - chrono::Duration::days(1), at(17, 0) - chrono::Duration::days(1));

        let res = svc
            .record(1, None, AttendanceMethod::Qr, None, at(23, 0))
            .await
            .unwrap();
        assert!(!res.is_late);
    }

    #[actix_web::test]
    async fn check_out_is_never_late() {
        let (svc, _) = service();
        svc.store().add_user(1, "Jane", Role::Staff);
        svc.store().add_shift(1, at(9, 0), at(17, 0));

        svc.record(1, None, AttendanceMethod::Qr, None, at(8, 50))
            .await
            .unwrap();
        let out = svc
            .record(1, None, AttendanceMethod::Qr, None, at(17, 30))
            .await
            .unwrap();
        assert_eq!(out.event_type, AttendanceType::CheckOut);
        assert!(!out.is_late);
    }

    #[actix_web::test]
    async fn location_is_stored_on_any_event() {
        let (svc, _) = service();
        svc.store().add_user(1, "Jane", Role::Staff);

        let here = GeoPoint::new(23.81, 90.41);
        svc.record(1, None, AttendanceMethod::Qr, Some(here), at(9, 0))
            .await
            .unwrap();
        let there = GeoPoint::new(23.82, 90.42);
        svc.record(1, None, AttendanceMethod::Qr, Some(there), at(17, 0))
            .await
            .unwrap();

        let user = svc.store().user(1).unwrap();
        assert_eq!(user.last_location, Some(there));
        assert_eq!(user.last_location_at, Some(at(17, 0)));
    }

    #[actix_web::test]
    async fn forced_type_skips_toggle() {
        let (svc, badges) = service();
        svc.store().add_user(1, "Jane", Role::Staff);

        let res = svc
            .record(
                1,
                Some(AttendanceType::CheckOut),
                AttendanceMethod::Manual,
                None,
                at(18, 0),
            )
            .await
            .unwrap();
        assert_eq!(res.event_type, AttendanceType::CheckOut);
        assert!(badges.calls().is_empty());
    }

    #[actix_web::test]
    async fn unknown_user_is_not_found() {
        let (svc, _) = service();
        let err = svc
            .record(99, None, AttendanceMethod::Qr, None, at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn failing_hook_does_not_fail_check_in() {
        let svc = crate::attendance::test_support::service_with_failing_hook();
        svc.store().add_user(1, "Jane", Role::Staff);

        let res = svc
            .record(1, None, AttendanceMethod::Qr, None, at(9, 0))
            .await
            .unwrap();
        assert_eq!(res.event_type, AttendanceType::CheckIn);
        assert_eq!(svc.store().records_for(1).len(), 1);
    }
}
