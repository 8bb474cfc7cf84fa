use std::env;
use std::str::FromStr;
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // QR tokens
    pub qr_secret: String,
    pub office_qr_ttl: u64,
    pub user_qr_ttl: u64,

    // Attendance policy
    pub late_tolerance_minutes: i64,
    pub fallback_geofence_meters: f64,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparseable setting, using default");
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            qr_secret: env::var("QR_SECRET").unwrap_or_else(|_| jwt_secret.clone()),
            jwt_secret,

            office_qr_ttl: env_or("OFFICE_QR_TTL", 30), // display refreshes every 30s
            user_qr_ttl: env_or("USER_QR_TTL", 30),

            late_tolerance_minutes: env_or("LATE_TOLERANCE_MINUTES", 15),
            fallback_geofence_meters: env_or("FALLBACK_GEOFENCE_METERS", 200.0),

            rate_scan_per_min: env_or("RATE_SCAN_PER_MIN", 120),
            rate_protected_per_min: env_or("RATE_PROTECTED_PER_MIN", 1000),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}
