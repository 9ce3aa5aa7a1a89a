//! Replay server library.
//!
//! Exposes the application modules so integration tests and the CLI can
//! reuse configuration, repositories, and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
