/*
 * Responsibility
 * - SQLx operations on the products table
 * - Any Postgres executor (pool or the request's transaction)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::query::{Conditions, OrderBy, Page, push_order_and_page};
use crate::repos::store::{OwnedResource, PgStore, ResourceStore};

pub const ORDER_BY_ID: &str = "product_id";
pub const ORDER_BY_USER_ID: &str = "user_id";
pub const ORDER_BY_NAME: &str = "name";
pub const ORDER_BY_COST: &str = "cost";
pub const ORDER_BY_QUANTITY: &str = "quantity";

const COLUMNS: &str = "product_id, user_id, name, cost, quantity, date_created, date_updated";

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    #[sqlx(rename = "product_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub cost: f64,
    pub quantity: i32,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl OwnedResource for ProductRow {
    const NAME: &'static str = "product";
    const PATH_PARAM: &'static str = "product_id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub user_id: Uuid,
    pub name: String,
    pub cost: f64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub quantity: Option<i32>,
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    let mut w = Conditions::new(qb);
    if let Some(id) = filter.id {
        w.and().push("product_id = ").push_bind(id);
    }
    if let Some(user_id) = filter.user_id {
        w.and().push("user_id = ").push_bind(user_id);
    }
    if let Some(name) = &filter.name {
        w.and().push("name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(cost) = filter.cost {
        w.and().push("cost = ").push_bind(cost);
    }
    if let Some(quantity) = filter.quantity {
        w.and().push("quantity = ").push_bind(quantity);
    }
}

pub async fn create<'e, E>(db: E, new: &NewProduct) -> Result<ProductRow, RepoError>
where
    E: PgExecutor<'e>,
{
    let now = Utc::now();
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        INSERT INTO products
            (product_id, user_id, name, cost, quantity, date_created, date_updated)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(&new.name)
    .bind(new.cost)
    .bind(new.quantity)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn get<'e, E>(db: E, product_id: Uuid) -> Result<Option<ProductRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {COLUMNS} FROM products WHERE product_id = $1"
    ))
    .bind(product_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn update<'e, E>(
    db: E,
    product_id: Uuid,
    changes: &ProductChanges,
) -> Result<Option<ProductRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        UPDATE products
        SET
            name = COALESCE($2, name),
            cost = COALESCE($3, cost),
            quantity = COALESCE($4, quantity),
            date_updated = $5
        WHERE product_id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(product_id)
    .bind(&changes.name)
    .bind(changes.cost)
    .bind(changes.quantity)
    .bind(Utc::now())
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete<'e, E>(db: E, product_id: Uuid) -> Result<bool, RepoError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
        .bind(product_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn list_query(
    filter: &ProductFilter,
    order: &OrderBy,
    page: &Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM products"));
    push_filter(&mut qb, filter);
    push_order_and_page(&mut qb, order, page);
    qb
}

pub async fn query<'e, E>(
    db: E,
    filter: &ProductFilter,
    order: &OrderBy,
    page: &Page,
) -> Result<Vec<ProductRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let mut qb = list_query(filter, order, page);
    let rows = qb.build_query_as::<ProductRow>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count<'e, E>(db: E, filter: &ProductFilter) -> Result<i64, RepoError>
where
    E: PgExecutor<'e>,
{
    let mut qb = QueryBuilder::new("SELECT COUNT(1) FROM products");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build_query_scalar().fetch_one(db).await?;
    Ok(total)
}

#[async_trait]
impl ResourceStore<ProductRow> for PgStore<ProductRow> {
    async fn fetch(&self, id: Uuid) -> Result<Option<ProductRow>, RepoError> {
        get(&self.db, id).await
    }
}
