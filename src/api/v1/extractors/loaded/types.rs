/*
 * Responsibility
 *  - Per-resource aliases of Loaded<T>
 *  - New resources get one line here
 */
use super::core::Loaded;
use crate::repos::{home_repo::HomeRow, product_repo::ProductRow, user_repo::UserRow};

pub type LoadedUser = Loaded<UserRow>;
pub type LoadedProduct = Loaded<ProductRow>;
pub type LoadedHome = Loaded<HomeRow>;
