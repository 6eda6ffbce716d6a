pub mod accounts;
pub mod catalog;
pub mod config;
pub mod email;
pub mod encoder;
pub mod fixtures;
pub mod password;
pub mod principal;
pub mod session;
pub mod slug;
