/*
 * Responsibility
 * - POST /tranexample: create a user and a product owned by that user,
 *   both through the request's transaction (all or nothing)
 */
use axum::{Extension, Json, http::StatusCode};

use crate::{
    api::v1::{
        dto::{products::ProductResponse, tran::CreateTranRequest, users::normalize_roles},
        extractors::AppJson,
        handlers::users::hash_blocking,
    },
    error::AppError,
    middleware::transaction::PgTx,
    repos::{product_repo, user_repo::{self, NewUser}},
};

pub async fn create_tran(
    Extension(tx): Extension<PgTx>,
    AppJson(req): AppJson<CreateTranRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    req.validate()?;
    let CreateTranRequest { user, product } = req;

    let new_user = NewUser {
        name: user.name,
        email: user.email,
        roles: normalize_roles(&user.roles),
        password_hash: hash_blocking(user.password).await?,
        department: user.department,
    };

    let mut conn = tx.conn().await?;
    let user = user_repo::create(&mut *conn, &new_user).await?;
    let product = product_repo::create(&mut *conn, &product.into_new(user.id)).await?;

    tracing::info!(user_id = %user.id, product_id = %product.id, "created user and product");

    Ok((StatusCode::CREATED, Json(product.into())))
}
