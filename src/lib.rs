//! rxgate — role-gated prescriptions API.
//!
//! Physicians issue prescriptions to patients for drugs; an analytics
//! endpoint reports aggregate drug usage over a date range. The interesting
//! parts live between the wire and the store: header-based identity
//! extraction, per-route RBAC, input validation, drug find-or-create, and a
//! parameterized aggregation query. Postgres is the sole source of truth.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;

pub use error::{Error, Result};
