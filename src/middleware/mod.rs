/*
 * Responsibility
 * - Middleware the routers mount: auth chain, transaction scoping,
 *   panic boundary, counters, transport (http / cors)
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod metrics;
pub mod panics;
pub mod transaction;
