pub mod attendance;
pub mod company_settings;
pub mod role;
pub mod shift;
pub mod shift_swap;
pub mod user;
