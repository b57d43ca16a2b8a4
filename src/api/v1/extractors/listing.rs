/*
 * Responsibility
 * - Parse the list query string shared by every collection route:
 *   page, rows, orderBy=field[,ASC|DESC]
 * - Map the client's order field onto a whitelisted column per resource
 * - Reject bad input as a 400 field error
 */
use std::marker::PhantomData;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use crate::error::AppError;
use crate::repos::query::{Direction, OrderBy, Page};

pub const MAX_ROWS_PER_PAGE: i64 = 100;

/// Orderable fields of one resource: client field name -> SQL column.
pub trait OrderFields: Send + Sync + 'static {
    const DEFAULT: OrderBy;
    const FIELDS: &'static [(&'static str, &'static str)];

    fn column(field: &str) -> Option<&'static str> {
        Self::FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawListing {
    page: Option<String>,
    rows: Option<String>,
    #[serde(rename = "orderBy")]
    order_by: Option<String>,
}

/// Page and order for a collection of `R`.
#[derive(Debug)]
pub struct Listing<R> {
    pub page: Page,
    pub order: OrderBy,
    _resource: PhantomData<fn() -> R>,
}

impl<R: OrderFields> Listing<R> {
    fn parse(raw: RawListing) -> Result<Self, AppError> {
        let defaults = Page::default();

        let number = match raw.page.as_deref() {
            None | Some("") => defaults.number,
            Some(v) => match v.parse::<i64>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(AppError::field("page", "must be a positive integer")),
            },
        };

        let rows_per_page = match raw.rows.as_deref() {
            None | Some("") => defaults.rows_per_page,
            Some(v) => match v.parse::<i64>() {
                Ok(n) if (1..=MAX_ROWS_PER_PAGE).contains(&n) => n,
                _ => {
                    return Err(AppError::field(
                        "rows",
                        format!("must be between 1 and {MAX_ROWS_PER_PAGE}"),
                    ));
                }
            },
        };

        // the OFFSET must stay representable
        if (number - 1).checked_mul(rows_per_page).is_none() {
            return Err(AppError::field("page", "is out of range"));
        }

        let order = match raw.order_by.as_deref() {
            None | Some("") => R::DEFAULT,
            Some(v) => parse_order::<R>(v)?,
        };

        Ok(Self {
            page: Page {
                number,
                rows_per_page,
            },
            order,
            _resource: PhantomData,
        })
    }
}

fn parse_order<R: OrderFields>(value: &str) -> Result<OrderBy, AppError> {
    let mut parts = value.splitn(2, ',');
    let field = parts.next().unwrap_or_default().trim();

    let direction = match parts.next().map(|d| d.trim().to_ascii_uppercase()) {
        None => Direction::Asc,
        Some(d) if d == "ASC" => Direction::Asc,
        Some(d) if d == "DESC" => Direction::Desc,
        Some(d) => {
            return Err(AppError::field(field, format!("unknown direction: {d}")));
        }
    };

    let column =
        R::column(field).ok_or_else(|| AppError::field(field, "order field does not exist"))?;

    Ok(OrderBy::new(column, direction))
}

impl<S, R> FromRequestParts<S> for Listing<R>
where
    S: Send + Sync,
    R: OrderFields,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawListing>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::bad_request("BAD_QUERY", e.body_text()))?;
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Things;

    impl OrderFields for Things {
        const DEFAULT: OrderBy = OrderBy::new("thing_id", Direction::Asc);
        const FIELDS: &'static [(&'static str, &'static str)] =
            &[("thing_id", "thing_id"), ("name", "name")];
    }

    fn raw(page: Option<&str>, rows: Option<&str>, order_by: Option<&str>) -> RawListing {
        RawListing {
            page: page.map(str::to_string),
            rows: rows.map(str::to_string),
            order_by: order_by.map(str::to_string),
        }
    }

    #[test]
    fn defaults_when_nothing_is_given() {
        let listing = Listing::<Things>::parse(RawListing::default()).unwrap();
        assert_eq!(listing.page, Page::default());
        assert_eq!(listing.order, Things::DEFAULT);
    }

    #[test]
    fn order_direction_is_case_insensitive() {
        let listing = Listing::<Things>::parse(raw(Some("2"), Some("25"), Some("name,desc"))).unwrap();
        assert_eq!(listing.page.number, 2);
        assert_eq!(listing.page.rows_per_page, 25);
        assert_eq!(listing.order, OrderBy::new("name", Direction::Desc));
    }

    #[test]
    fn unknown_order_field_is_a_field_error() {
        let err = Listing::<Things>::parse(raw(None, None, Some("password_hash"))).unwrap_err();
        match err {
            AppError::Validation { fields, .. } => {
                assert_eq!(fields[0].field, "password_hash");
                assert_eq!(fields[0].error, "order field does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rows_outside_bounds_are_rejected() {
        assert!(Listing::<Things>::parse(raw(None, Some("0"), None)).is_err());
        assert!(Listing::<Things>::parse(raw(None, Some("101"), None)).is_err());
        assert!(Listing::<Things>::parse(raw(Some("0"), None, None)).is_err());
        assert!(Listing::<Things>::parse(raw(Some("abc"), None, None)).is_err());
    }

    #[test]
    fn page_too_large_for_an_offset_is_rejected() {
        let huge = i64::MAX.to_string();
        let err = Listing::<Things>::parse(raw(Some(&huge), Some("100"), None)).unwrap_err();
        match err {
            AppError::Validation { fields, .. } => assert_eq!(fields[0].field, "page"),
            other => panic!("unexpected error: {other:?}"),
        }

        // with one row per page every page number still has an offset
        let listing = Listing::<Things>::parse(raw(Some(&huge), Some("1"), None)).unwrap();
        assert_eq!(listing.page.offset(), i64::MAX - 1);
    }
}
