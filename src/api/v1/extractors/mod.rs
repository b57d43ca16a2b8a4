/*
 * Responsibility
 * - Extractors shared by the v1 handlers
 */
pub mod auth_ctx;
pub mod body;
pub mod listing;
pub mod loaded;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use body::{AppJson, AppQuery};
pub use listing::{Listing, OrderFields};
pub use loaded::{Loaded, LoadedHome, LoadedProduct, LoadedUser, ResourceOwner};
