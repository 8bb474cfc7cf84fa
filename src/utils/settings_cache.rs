use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

use crate::model::company_settings::CompanySettings;

/// The singleton settings row, read on every office scan.
/// `Some(None)` caches "no row configured yet".
static SETTINGS_CACHE: Lazy<Cache<(), Option<CompanySettings>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1)
        .time_to_live(Duration::from_secs(60))
        .build()
});

pub async fn get() -> Option<Option<CompanySettings>> {
    SETTINGS_CACHE.get(&()).await
}

pub async fn put(settings: Option<CompanySettings>) {
    SETTINGS_CACHE.insert((), settings).await;
}

/// Drop the cached row after an admin update
pub async fn invalidate() {
    SETTINGS_CACHE.invalidate(&()).await;
    log::info!("Company settings cache invalidated");
}
