/*
 * Responsibility
 * - Envelope returned by every collection route
 */
use serde::Serialize;

use crate::repos::query::Page;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub rows_per_page: i64,
}

impl<T> PageDocument<T> {
    pub fn new(items: Vec<T>, total: i64, page: &Page) -> Self {
        Self {
            items,
            total,
            page: page.number,
            rows_per_page: page.rows_per_page,
        }
    }
}
