//! The engine controller and its line protocols.

pub mod controller;
pub mod gamelog;
pub mod protocol;

pub use controller::Engine;
pub use protocol::Protocol;

pub const APP_NAME: &str = "Riposte";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
