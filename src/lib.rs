//! Activation and entitlement backend: single-use activation codes, device
//! bindings with plan-based expiry, and a glyph dictionary API gated behind
//! activation status.

pub mod activation;
pub mod config;
pub mod db;
pub mod dict;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod util;
