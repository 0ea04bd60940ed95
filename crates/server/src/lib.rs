//! Officina Server Library
//!
//! This library exposes server internals for integration testing.
//! The main entry point for running the server is the `officina` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use config::Config;
pub use state::AppState;
