//! User Auth Backend Library
//!
//! Register / login / profile over HTTP, backed by SQLite and guarded by
//! HS256 bearer tokens. Exposes the modules for the binary and for tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;

pub use api::create_router;
pub use config::Config;
