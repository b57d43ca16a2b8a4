/*
 * Responsibility
 * - The auth chain, in the order routes mount it:
 *   access (authenticate) -> resource (loader) -> authorize
 */
pub mod access;
pub mod authorize;
pub mod resource;

pub use access::authenticate;
pub use authorize::authorize;
pub use resource::{ResourceLoader, load_resource};
