/*
 * Responsibility
 * - /users CRUD handlers and the token endpoint
 * - Routes carrying {user_id} receive the row from the loader (LoadedUser),
 *   so get-by-id never reads the table twice
 * - Password hashing runs on the blocking pool
 */
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose};

use crate::{
    api::v1::{
        dto::{
            page::PageDocument,
            users::{
                CreateUserRequest, TokenResponse, UpdateUserRequest, UserFilterParams,
                UserResponse, looks_like_email, normalize_roles,
            },
        },
        extractors::{AppJson, AppQuery, AuthCtxExtractor, Listing, LoadedUser, OrderFields},
    },
    error::AppError,
    repos::{
        query::{Direction, OrderBy},
        user_repo::{self, NewUser, UserChanges, UserFilter, UserRow},
    },
    services::auth::{
        Role,
        password::{hash_password, verify_password},
    },
    state::AppState,
};

impl OrderFields for UserRow {
    const DEFAULT: OrderBy = OrderBy::new(user_repo::ORDER_BY_ID, Direction::Asc);
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("user_id", user_repo::ORDER_BY_ID),
        ("name", user_repo::ORDER_BY_NAME),
        ("email", user_repo::ORDER_BY_EMAIL),
        ("enabled", user_repo::ORDER_BY_ENABLED),
    ];
}

pub(crate) async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "password hashing task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AppError::Internal
        })
}

/// `Authorization: Basic base64(email:password)`.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let (scheme, encoded) = value.split_once(' ').ok_or(AppError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AppError::Unauthorized);
    }

    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::Unauthorized)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AppError::Unauthorized)?;
    let (email, password) = decoded.split_once(':').ok_or(AppError::Unauthorized)?;

    Ok((email.to_string(), password.to_string()))
}

/// GET /users/token/{kid}: exchange Basic credentials for a signed access token.
pub async fn token(
    State(state): State<AppState>,
    Path(kid): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    if state.auth.signing_kid() != Some(kid.as_str()) {
        return Err(AppError::field("kid", "unknown key id"));
    }

    let (email, password) = basic_credentials(&headers)?;
    if !looks_like_email(&email) {
        return Err(AppError::Unauthorized);
    }

    let user = user_repo::get_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::not_found("user"))?;

    if !user.enabled {
        tracing::warn!(user_id = %user.id, "token requested for disabled user");
        return Err(AppError::Unauthorized);
    }

    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "password verification task failed");
            AppError::Internal
        })?;
    if !matches {
        tracing::warn!(user_id = %user.id, "token requested with wrong password");
        return Err(AppError::Unauthorized);
    }

    let roles: Vec<Role> = user.roles.iter().filter_map(|r| Role::parse(r)).collect();
    let token = state.auth.issue(user.id, &roles)?;

    Ok(Json(TokenResponse { token }))
}

pub async fn list_users(
    State(state): State<AppState>,
    listing: Listing<UserRow>,
    AppQuery(params): AppQuery<UserFilterParams>,
) -> Result<Json<PageDocument<UserResponse>>, AppError> {
    let filter = UserFilter {
        id: params.user_id,
        name: params.name,
        email: params.email,
        start_created_date: params.start_created_date,
        end_created_date: params.end_created_date,
    };

    let rows = user_repo::query(&state.db, &filter, &listing.order, &listing.page).await?;
    let total = user_repo::count(&state.db, &filter).await?;

    let items = rows.into_iter().map(UserResponse::from).collect();
    Ok(Json(PageDocument::new(items, total, &listing.page)))
}

pub async fn create_user(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()?;

    let new = NewUser {
        name: req.name,
        email: req.email,
        roles: normalize_roles(&req.roles),
        password_hash: hash_blocking(req.password).await?,
        department: req.department,
    };
    let row = user_repo::create(&state.db, &new).await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_user(loaded: LoadedUser) -> Json<UserResponse> {
    Json(loaded.into_inner().into())
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    loaded: LoadedUser,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if req.touches_admin_fields() && !ctx.is_admin() {
        tracing::warn!(
            user_id = %ctx.user_id,
            target = %loaded.resource.id,
            "non-admin tried to change roles or enabled"
        );
        return Err(AppError::Forbidden);
    }
    req.validate()?;

    let password_hash = match req.password {
        Some(password) => Some(hash_blocking(password).await?),
        None => None,
    };
    let changes = UserChanges {
        name: req.name,
        email: req.email,
        roles: req.roles.as_deref().map(normalize_roles),
        password_hash,
        department: req.department,
        enabled: req.enabled,
    };

    let row = user_repo::update(&state.db, loaded.resource.id, &changes)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    loaded: LoadedUser,
) -> Result<StatusCode, AppError> {
    user_repo::delete(&state.db, loaded.resource.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
