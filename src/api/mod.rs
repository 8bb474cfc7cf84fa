pub mod attendance;
pub mod qr;
pub mod settings;
pub mod swap;
