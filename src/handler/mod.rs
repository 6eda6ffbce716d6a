pub mod admin;
pub mod auth;
pub mod error;
pub mod health;
pub mod me;
pub mod principal;
