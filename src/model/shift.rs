use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Shift {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub start_time: NaiveDateTime,
    #[schema(example = "2026-01-01T17:00:00", format = "date-time", value_type = String)]
    pub end_time: NaiveDateTime,
    #[schema(example = "MORNING")]
    pub shift_type: String,
    #[schema(example = "SCHEDULED")]
    pub status: String,
}

/// Shift status that no longer occupies its owner's time.
pub const CANCELLED_STATUS: &str = "CANCELLED";

impl Shift {
    pub fn is_active(&self) -> bool {
        self.status != CANCELLED_STATUS
    }

    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_time < end && start < self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn shift(start_h: u32, end_h: u32, status: &str) -> Shift {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        Shift {
            id: 1,
            user_id: 1,
            start_time: day.and_hms_opt(start_h, 0, 0).unwrap(),
            end_time: day.and_hms_opt(end_h, 0, 0).unwrap(),
            shift_type: "REGULAR".to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn overlap_is_half_open() {
        let s = shift(9, 17, "SCHEDULED");
        let other = shift(17, 20, "SCHEDULED");
        assert!(!s.overlaps(other.start_time, other.end_time));
        let other = shift(16, 20, "SCHEDULED");
        assert!(s.overlaps(other.start_time, other.end_time));
    }

    #[test]
    fn cancelled_shift_is_inactive() {
        assert!(shift(9, 17, "SCHEDULED").is_active());
        assert!(!shift(9, 17, CANCELLED_STATUS).is_active());
    }
}
