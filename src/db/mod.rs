//! Postgres persistence for the membership graph.

pub mod membership_repo;
pub mod models;
pub mod registration_repo;
