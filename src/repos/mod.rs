/*
 * Responsibility
 * - Storage access per table (users / products / homes)
 * - Shared paging/ordering helpers and the ownership lookup seam
 */
pub mod error;
pub mod home_repo;
pub mod product_repo;
pub mod query;
pub mod store;
pub mod user_repo;
