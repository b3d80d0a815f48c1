/*
 * Responsibility
 * - v1 public surface (re-exports routes())
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
