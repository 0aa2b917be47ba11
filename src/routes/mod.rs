pub mod admin;
pub mod admin_api;
pub mod auth;
pub mod public;
