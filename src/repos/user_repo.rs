/*
 * Responsibility
 * - SQLx operations on the users table
 * - Any Postgres executor (pool or the request's transaction)
 * - DB errors returned as RepoError (unique email => Conflict)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::query::{Conditions, OrderBy, Page, push_order_and_page};
use crate::repos::store::{OwnedResource, PgStore, ResourceStore};

pub const ORDER_BY_ID: &str = "user_id";
pub const ORDER_BY_NAME: &str = "name";
pub const ORDER_BY_EMAIL: &str = "email";
pub const ORDER_BY_ENABLED: &str = "enabled";

const COLUMNS: &str =
    "user_id, name, email, roles, password_hash, department, enabled, date_created, date_updated";

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "user_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub password_hash: String,
    pub department: Option<String>,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl OwnedResource for UserRow {
    const NAME: &'static str = "user";
    const PATH_PARAM: &'static str = "user_id";

    fn id(&self) -> Uuid {
        self.id
    }

    // A user owns itself.
    fn owner_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub password_hash: String,
    pub department: Option<String>,
}

/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub password_hash: Option<String>,
    pub department: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub start_created_date: Option<DateTime<Utc>>,
    pub end_created_date: Option<DateTime<Utc>>,
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    let mut w = Conditions::new(qb);
    if let Some(id) = filter.id {
        w.and().push("user_id = ").push_bind(id);
    }
    if let Some(name) = &filter.name {
        w.and().push("name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(email) = &filter.email {
        w.and().push("email = ").push_bind(email.clone());
    }
    if let Some(start) = filter.start_created_date {
        w.and().push("date_created >= ").push_bind(start);
    }
    if let Some(end) = filter.end_created_date {
        w.and().push("date_created <= ").push_bind(end);
    }
}

pub async fn create<'e, E>(db: E, new: &NewUser) -> Result<UserRow, RepoError>
where
    E: PgExecutor<'e>,
{
    let now = Utc::now();
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users
            (user_id, name, email, roles, password_hash, department, enabled, date_created, date_updated)
        VALUES ($1, $2, $3, $4, $5, $6, true, $7, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.roles)
    .bind(&new.password_hash)
    .bind(&new.department)
    .bind(now)
    .fetch_one(db)
    .await
    .map_err(|e| RepoError::from_sqlx(e, "email is already in use"))?;

    Ok(row)
}

pub async fn get<'e, E>(db: E, user_id: Uuid) -> Result<Option<UserRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {COLUMNS} FROM users WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn get_by_email<'e, E>(db: E, email: &str) -> Result<Option<UserRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn update<'e, E>(
    db: E,
    user_id: Uuid,
    changes: &UserChanges,
) -> Result<Option<UserRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users
        SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            roles = COALESCE($4, roles),
            password_hash = COALESCE($5, password_hash),
            department = COALESCE($6, department),
            enabled = COALESCE($7, enabled),
            date_updated = $8
        WHERE user_id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&changes.name)
    .bind(&changes.email)
    .bind(&changes.roles)
    .bind(&changes.password_hash)
    .bind(&changes.department)
    .bind(changes.enabled)
    .bind(Utc::now())
    .fetch_optional(db)
    .await
    .map_err(|e| RepoError::from_sqlx(e, "email is already in use"))?;

    Ok(row)
}

pub async fn delete<'e, E>(db: E, user_id: Uuid) -> Result<bool, RepoError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn list_query(filter: &UserFilter, order: &OrderBy, page: &Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users"));
    push_filter(&mut qb, filter);
    push_order_and_page(&mut qb, order, page);
    qb
}

pub async fn query<'e, E>(
    db: E,
    filter: &UserFilter,
    order: &OrderBy,
    page: &Page,
) -> Result<Vec<UserRow>, RepoError>
where
    E: PgExecutor<'e>,
{
    let mut qb = list_query(filter, order, page);
    let rows = qb.build_query_as::<UserRow>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count<'e, E>(db: E, filter: &UserFilter) -> Result<i64, RepoError>
where
    E: PgExecutor<'e>,
{
    let mut qb = QueryBuilder::new("SELECT COUNT(1) FROM users");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build_query_scalar().fetch_one(db).await?;
    Ok(total)
}

#[async_trait]
impl ResourceStore<UserRow> for PgStore<UserRow> {
    async fn fetch(&self, id: Uuid) -> Result<Option<UserRow>, RepoError> {
        get(&self.db, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::query::Direction;

    #[test]
    fn list_query_binds_only_present_filters() {
        let filter = UserFilter {
            name: Some("ada".into()),
            email: Some("ada@example.com".into()),
            ..Default::default()
        };
        let qb = list_query(
            &filter,
            &OrderBy::new(ORDER_BY_NAME, Direction::Asc),
            &Page::default(),
        );

        assert_eq!(
            qb.sql(),
            format!(
                "SELECT {COLUMNS} FROM users WHERE name ILIKE $1 AND email = $2 \
                 ORDER BY name ASC OFFSET $3 ROWS FETCH NEXT $4 ROWS ONLY"
            )
        );
    }

    #[test]
    fn user_owns_itself() {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            roles: vec!["user".into()],
            password_hash: String::new(),
            department: None,
            enabled: true,
            date_created: now,
            date_updated: now,
        };
        assert_eq!(row.owner_id(), row.id);
    }
}
