pub mod geo;
pub mod settings_cache;
