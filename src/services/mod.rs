pub mod auth;
pub mod consent;
