pub mod health;
pub mod membership;
pub mod routes;
pub mod tournaments;
