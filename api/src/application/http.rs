pub mod classify;
pub mod health;
pub mod server;
