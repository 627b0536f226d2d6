// Library root — exposes internals for integration tests.
// The binary entry point is src/main.rs.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod logger;
pub mod net;
pub mod store;
