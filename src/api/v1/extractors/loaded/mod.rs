/**
 * Responsibility
 *  - Bundle core and types
 *  - Control what handlers and middleware can see
 */
mod core;
mod types;

pub use core::{Loaded, ResourceOwner};
pub use types::*;
