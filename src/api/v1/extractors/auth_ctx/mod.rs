/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Give handlers the authenticated request context (AuthCtx)
 * - axum-specific code stays in core; the type lives in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
