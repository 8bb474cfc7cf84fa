use anyhow::{Context, Result};
use sqlx::MySqlPool;
use strum_macros::{AsRefStr, Display};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeEvent {
    AttendanceCheckin,
}

/// Gamification collaborator. `trigger` must return immediately; whatever it
/// does afterwards can fail without affecting the caller.
pub trait BadgeHook: Send + Sync {
    fn trigger(&self, user_id: u64, event: BadgeEvent);
}

/// Check-in count at which each badge is earned.
const CHECKIN_MILESTONES: &[(i64, &str)] = &[
    (1, "FIRST_CHECKIN"),
    (10, "REGULAR"),
    (50, "DEDICATED"),
    (100, "VETERAN"),
];

pub fn milestone_badge(checkins: i64) -> Option<&'static str> {
    CHECKIN_MILESTONES
        .iter()
        .find(|(count, _)| *count == checkins)
        .map(|(_, badge)| *badge)
}

#[derive(Clone)]
pub struct DbBadgeHook {
    pool: MySqlPool,
}

impl DbBadgeHook {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl BadgeHook for DbBadgeHook {
    fn trigger(&self, user_id: u64, event: BadgeEvent) {
        let pool = self.pool.clone();

        actix_web::rt::spawn(async move {
            if let Err(e) = award_badges(&pool, user_id, event).await {
                tracing::error!(error = ?e, user_id, %event, "Badge award failed");
            }
        });
    }
}

async fn award_badges(pool: &MySqlPool, user_id: u64, event: BadgeEvent) -> Result<()> {
    match event {
        BadgeEvent::AttendanceCheckin => {
            let checkins = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM attendance_records
                WHERE user_id = ?
                AND kind = 'CHECK_IN'
                "#,
            )
            .bind(user_id)
            .fetch_one(pool)
            .await
            .context("counting check-ins")?;

            let Some(badge) = milestone_badge(checkins) else {
                return Ok(());
            };

            sqlx::query(
                r#"
                INSERT IGNORE INTO user_badges (user_id, badge, awarded_at)
                VALUES (?, ?, NOW())
                "#,
            )
            .bind(user_id)
            .bind(badge)
            .execute(pool)
            .await
            .with_context(|| format!("inserting badge {badge}"))?;

            tracing::info!(user_id, badge, "Badge awarded");
        }
    }

    Ok(())
}
