/*
 * Responsibility
 * - v1 surface: request/response shapes, extractors, handlers
 * - routes() is the only entry point app.rs needs
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
