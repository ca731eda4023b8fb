pub mod auth;
pub mod client;
pub mod handlers;
pub mod router;
pub mod ws_types;
