//! OpenMusic: playlist and authentication REST backend.
//!
//! The binary in `main.rs` wires these modules to Postgres and Redis;
//! integration tests in `tests/` drive them through in-memory collaborators.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod queue;
pub mod services;
pub mod state;
pub mod store;

pub use errors::{AppError, AppResult};
pub use state::AppState;
