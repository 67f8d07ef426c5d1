//! Esports league server: team and clan membership with leadership succession.

pub mod config;
pub mod db;
pub mod http;
pub mod membership;
pub mod metrics;
pub mod registration;
