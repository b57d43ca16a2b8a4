//! Paging, ordering and filter helpers shared by the list queries.

use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Sort order; `column` always comes from a per-resource whitelist, never from
/// the client, so it is safe to splice into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: Direction,
}

impl OrderBy {
    pub const fn new(column: &'static str, direction: Direction) -> Self {
        Self { column, direction }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub rows_per_page: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.rows_per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            rows_per_page: 10,
        }
    }
}

/// Pushes `WHERE` before the first condition and `AND` before the rest.
pub struct Conditions<'q, 'b> {
    qb: &'b mut QueryBuilder<'q, Postgres>,
    empty: bool,
}

impl<'q, 'b> Conditions<'q, 'b> {
    pub fn new(qb: &'b mut QueryBuilder<'q, Postgres>) -> Self {
        Self { qb, empty: true }
    }

    pub fn and(&mut self) -> &mut QueryBuilder<'q, Postgres> {
        if self.empty {
            self.qb.push(" WHERE ");
            self.empty = false;
        } else {
            self.qb.push(" AND ");
        }
        self.qb
    }
}

pub fn push_order_and_page(qb: &mut QueryBuilder<'_, Postgres>, order: &OrderBy, page: &Page) {
    qb.push(" ORDER BY ")
        .push(order.column)
        .push(" ")
        .push(order.direction.as_sql());
    qb.push(" OFFSET ")
        .push_bind(page.offset())
        .push(" ROWS FETCH NEXT ")
        .push_bind(page.rows_per_page)
        .push(" ROWS ONLY");
}
