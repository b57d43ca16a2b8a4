/*
 * Responsibility
 * - /homes CRUD handlers
 * - New homes belong to the caller; {home_id} routes reuse the loaded row
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::{
            homes::{CreateHomeRequest, HomeFilterParams, HomeResponse, UpdateHomeRequest},
            page::PageDocument,
        },
        extractors::{AppJson, AppQuery, AuthCtxExtractor, Listing, LoadedHome, OrderFields},
    },
    error::AppError,
    repos::{
        home_repo::{self, HomeFilter, HomeRow},
        query::{Direction, OrderBy},
    },
    state::AppState,
};

impl OrderFields for HomeRow {
    const DEFAULT: OrderBy = OrderBy::new(home_repo::ORDER_BY_ID, Direction::Asc);
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("home_id", home_repo::ORDER_BY_ID),
        ("type", home_repo::ORDER_BY_TYPE),
        ("user_id", home_repo::ORDER_BY_USER_ID),
    ];
}

pub async fn list_homes(
    State(state): State<AppState>,
    listing: Listing<HomeRow>,
    AppQuery(params): AppQuery<HomeFilterParams>,
) -> Result<Json<PageDocument<HomeResponse>>, AppError> {
    let filter = HomeFilter::try_from(params)?;

    let rows = home_repo::query(&state.db, &filter, &listing.order, &listing.page).await?;
    let total = home_repo::count(&state.db, &filter).await?;

    let items = rows.into_iter().map(HomeResponse::from).collect();
    Ok(Json(PageDocument::new(items, total, &listing.page)))
}

pub async fn create_home(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    AppJson(req): AppJson<CreateHomeRequest>,
) -> Result<(StatusCode, Json<HomeResponse>), AppError> {
    let new = req.into_new(ctx.user_id)?;
    let row = home_repo::create(&state.db, &new).await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_home(loaded: LoadedHome) -> Json<HomeResponse> {
    Json(loaded.into_inner().into())
}

pub async fn update_home(
    State(state): State<AppState>,
    loaded: LoadedHome,
    AppJson(req): AppJson<UpdateHomeRequest>,
) -> Result<Json<HomeResponse>, AppError> {
    let changes = req.into_changes()?;

    let row = home_repo::update(&state.db, loaded.resource.id, &changes)
        .await?
        .ok_or(AppError::not_found("home"))?;

    Ok(Json(row.into()))
}

pub async fn delete_home(
    State(state): State<AppState>,
    loaded: LoadedHome,
) -> Result<StatusCode, AppError> {
    home_repo::delete(&state.db, loaded.resource.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
