/*
 * Responsibility
 * - SQLx operations on the homes table
 * - HomeType <-> TEXT column mapping
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::query::{Conditions, OrderBy, Page, push_order_and_page};
use crate::repos::store::{OwnedResource, PgStore, ResourceStore};

pub const ORDER_BY_ID: &str = "home_id";
pub const ORDER_BY_TYPE: &str = "type";
pub const ORDER_BY_USER_ID: &str = "user_id";

const COLUMNS: &str = "home_id, user_id, type, address1, address2, zip_code, city, state, \
                       country, date_created, date_updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HomeType {
    Single,
    Condo,
}

#[derive(Debug, Error)]
#[error("invalid home type: {0}")]
pub struct InvalidHomeType(pub String);

impl HomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeType::Single => "SINGLE",
            HomeType::Condo => "CONDO",
        }
    }

    pub fn parse(s: &str) -> Result<Self, InvalidHomeType> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SINGLE" => Ok(HomeType::Single),
            "CONDO" => Ok(HomeType::Condo),
            _ => Err(InvalidHomeType(s.to_string())),
        }
    }
}

impl TryFrom<String> for HomeType {
    type Error = InvalidHomeType;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HomeType::parse(&s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub address1: String,
    pub address2: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct HomeRow {
    #[sqlx(rename = "home_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type", try_from = "String")]
    pub home_type: HomeType,
    #[sqlx(flatten)]
    pub address: Address,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl OwnedResource for HomeRow {
    const NAME: &'static str = "home";
    const PATH_PARAM: &'static str = "home_id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewHome {
    pub user_id: Uuid,
    pub home_type: HomeType,
    pub address: Address,
}

/// Address fields are replaced together when present.
#[derive(Debug, Clone, Default)]
pub struct HomeChanges {
    pub home_type: Option<HomeType>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default)]
pub struct HomeFilter {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub home_type: Option<HomeType>,
    pub start_created_date: Option<DateTime<Utc>>,
    pub end_created_date: Option<DateTime<Utc>>,
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &HomeFilter) {
    let mut w = Conditions::new(qb);
    if let Some(id) = filter.id {
        w.and().push("home_id = ").push_bind(id);
    }
    if let Some(user_id) = filter.user_id {
        w.and().push("user_id = ").push_bind(user_id);
    }
    if let Some(home_type) = filter.home_type {
        w.and().push("type = ").push_bind(home_type.as_str());
    }
    if let Some(start) = filter.start_created_date {
        w.and().push("date_created >= ").push_bind(start);
    }
    if let Some(end) = filter.end_created_date {
        w.and().push("date_created <= ").push_bind(end);
    }
}

pub async fn create<'e, E>(db: E, new: &NewHome) -> Result<HomeRow, RepoError>
where
    E: PgExecutor<'e>,
{
    let now = Utc::now();
    let a = &new.address;
    let row = sqlx::query_as::<_, HomeRow>(&format!(
        r#"
        INSERT INTO homes
            (home_id, user_id, type, address1, address2, zip_code, city, state, country,
             date_created, date_updated)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.home_type.as_str())
    .bind(&a.address1)
    .bind(&a.address2)
    .bind(&a.zip_code)
    .bind(&a.city)
    .bind(&a.state)
    .bind(&a.country)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn get<'e, E>(db: E, home_id: Uuid) -> Result<Option<HomeRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, HomeRow>(&format!(
        "SELECT {COLUMNS} FROM homes WHERE home_id = $1"
    ))
    .bind(home_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn update<'e, E>(
    db: E,
    home_id: Uuid,
    changes: &HomeChanges,
) -> Result<Option<HomeRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let a = changes.address.as_ref();
    let row = sqlx::query_as::<_, HomeRow>(&format!(
        r#"
        UPDATE homes
        SET
            type = COALESCE($2, type),
            address1 = COALESCE($3, address1),
            address2 = COALESCE($4, address2),
            zip_code = COALESCE($5, zip_code),
            city = COALESCE($6, city),
            state = COALESCE($7, state),
            country = COALESCE($8, country),
            date_updated = $9
        WHERE home_id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(home_id)
    .bind(changes.home_type.map(|t| t.as_str()))
    .bind(a.map(|a| a.address1.as_str()))
    .bind(a.map(|a| a.address2.as_str()))
    .bind(a.map(|a| a.zip_code.as_str()))
    .bind(a.map(|a| a.city.as_str()))
    .bind(a.map(|a| a.state.as_str()))
    .bind(a.map(|a| a.country.as_str()))
    .bind(Utc::now())
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete<'e, E>(db: E, home_id: Uuid) -> Result<bool, RepoError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM homes WHERE home_id = $1")
        .bind(home_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn list_query(filter: &HomeFilter, order: &OrderBy, page: &Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM homes"));
    push_filter(&mut qb, filter);
    push_order_and_page(&mut qb, order, page);
    qb
}

pub async fn query<'e, E>(
    db: E,
    filter: &HomeFilter,
    order: &OrderBy,
    page: &Page,
) -> Result<Vec<HomeRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let mut qb = list_query(filter, order, page);
    let rows = qb.build_query_as::<HomeRow>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count<'e, E>(db: E, filter: &HomeFilter) -> Result<i64, RepoError>
where
    E: PgExecutor<'e>,
{
    let mut qb = QueryBuilder::new("SELECT COUNT(1) FROM homes");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build_query_scalar().fetch_one(db).await?;
    Ok(total)
}

#[async_trait]
impl ResourceStore<HomeRow> for PgStore<HomeRow> {
    async fn fetch(&self, id: Uuid) -> Result<Option<HomeRow>, RepoError> {
        get(&self.db, id).await
    }
}
