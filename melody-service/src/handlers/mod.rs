//! HTTP handlers for the melody service.

pub mod callback;
pub mod health;
pub mod metrics;
pub mod music;
