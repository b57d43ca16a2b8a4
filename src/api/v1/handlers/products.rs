/*
 * Responsibility
 * - /products CRUD handlers
 * - New products belong to the caller; {product_id} routes reuse the loaded row
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::{
            page::PageDocument,
            products::{
                CreateProductRequest, ProductFilterParams, ProductResponse, UpdateProductRequest,
            },
        },
        extractors::{AppJson, AppQuery, AuthCtxExtractor, Listing, LoadedProduct, OrderFields},
    },
    error::AppError,
    repos::{
        product_repo::{self, ProductFilter, ProductRow},
        query::{Direction, OrderBy},
    },
    state::AppState,
};

impl OrderFields for ProductRow {
    const DEFAULT: OrderBy = OrderBy::new(product_repo::ORDER_BY_ID, Direction::Asc);
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("product_id", product_repo::ORDER_BY_ID),
        ("user_id", product_repo::ORDER_BY_USER_ID),
        ("name", product_repo::ORDER_BY_NAME),
        ("cost", product_repo::ORDER_BY_COST),
        ("quantity", product_repo::ORDER_BY_QUANTITY),
    ];
}

pub async fn list_products(
    State(state): State<AppState>,
    listing: Listing<ProductRow>,
    AppQuery(params): AppQuery<ProductFilterParams>,
) -> Result<Json<PageDocument<ProductResponse>>, AppError> {
    let filter = ProductFilter::from(params);

    let rows = product_repo::query(&state.db, &filter, &listing.order, &listing.page).await?;
    let total = product_repo::count(&state.db, &filter).await?;

    let items = rows.into_iter().map(ProductResponse::from).collect();
    Ok(Json(PageDocument::new(items, total, &listing.page)))
}

pub async fn create_product(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    AppJson(req): AppJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    req.validate()?;

    let row = product_repo::create(&state.db, &req.into_new(ctx.user_id)).await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_product(loaded: LoadedProduct) -> Json<ProductResponse> {
    Json(loaded.into_inner().into())
}

pub async fn update_product(
    State(state): State<AppState>,
    loaded: LoadedProduct,
    AppJson(req): AppJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    req.validate()?;

    let row = product_repo::update(&state.db, loaded.resource.id, &req.into())
        .await?
        .ok_or(AppError::not_found("product"))?;

    Ok(Json(row.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    loaded: LoadedProduct,
) -> Result<StatusCode, AppError> {
    product_repo::delete(&state.db, loaded.resource.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
