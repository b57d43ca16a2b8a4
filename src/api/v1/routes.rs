/*
 * Responsibility
 * - v1 URL structure and, per route group, the order of its middleware chain:
 *     authenticate -> (load resource) -> authorize -> (transaction) -> handler
 * - ServiceBuilder lists layers outermost first, so each chain reads top to bottom
 * - route_layer: the chain only runs for a matched route
 */
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::{
    api::v1::handlers::{
        homes::{create_home, delete_home, get_home, list_homes, update_home},
        products::{create_product, delete_product, get_product, list_products, update_product},
        tran::create_tran,
        users::{create_user, delete_user, get_user, list_users, token, update_user},
    },
    middleware::{
        auth::{ResourceLoader, authenticate, authorize, load_resource},
        transaction::{PgBeginner, transaction},
    },
    repos::{
        home_repo::HomeRow, product_repo::ProductRow, store::PgStore, user_repo::UserRow,
    },
    services::auth::Rule,
    state::AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(user_routes(state))
        .merge(product_routes(state))
        .merge(home_routes(state))
        .merge(tran_routes(state))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let loader = ResourceLoader::new(PgStore::<UserRow>::new(state.db.clone()));

    Router::new()
        .route("/users/token/{kid}", get(token))
        .route(
            "/users",
            get(list_users).post(create_user).route_layer(
                ServiceBuilder::new()
                    .layer(from_fn_with_state(state.auth.clone(), authenticate))
                    .layer(from_fn_with_state(Rule::AdminOnly, authorize)),
            ),
        )
        .route(
            "/users/{user_id}",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .route_layer(
                    ServiceBuilder::new()
                        .layer(from_fn_with_state(state.auth.clone(), authenticate))
                        .layer(from_fn_with_state(loader, load_resource::<UserRow>))
                        .layer(from_fn_with_state(Rule::AdminOrSubject, authorize)),
                ),
        )
}

fn product_routes(state: &AppState) -> Router<AppState> {
    let loader = ResourceLoader::new(PgStore::<ProductRow>::new(state.db.clone()));

    Router::new()
        .route(
            "/products",
            get(list_products)
                .route_layer(
                    ServiceBuilder::new()
                        .layer(from_fn_with_state(state.auth.clone(), authenticate))
                        .layer(from_fn_with_state(Rule::Any, authorize)),
                )
                .merge(
                    post(create_product).route_layer(
                        ServiceBuilder::new()
                            .layer(from_fn_with_state(state.auth.clone(), authenticate))
                            .layer(from_fn_with_state(Rule::UserOnly, authorize)),
                    ),
                ),
        )
        .route(
            "/products/{product_id}",
            get(get_product)
                .put(update_product)
                .delete(delete_product)
                .route_layer(
                    ServiceBuilder::new()
                        .layer(from_fn_with_state(state.auth.clone(), authenticate))
                        .layer(from_fn_with_state(loader, load_resource::<ProductRow>))
                        .layer(from_fn_with_state(Rule::AdminOrSubject, authorize)),
                ),
        )
}

fn home_routes(state: &AppState) -> Router<AppState> {
    let loader = ResourceLoader::new(PgStore::<HomeRow>::new(state.db.clone()));

    Router::new()
        .route(
            "/homes",
            get(list_homes)
                .route_layer(
                    ServiceBuilder::new()
                        .layer(from_fn_with_state(state.auth.clone(), authenticate))
                        .layer(from_fn_with_state(Rule::Any, authorize)),
                )
                .merge(
                    post(create_home).route_layer(
                        ServiceBuilder::new()
                            .layer(from_fn_with_state(state.auth.clone(), authenticate))
                            .layer(from_fn_with_state(Rule::UserOnly, authorize)),
                    ),
                ),
        )
        .route(
            "/homes/{home_id}",
            get(get_home)
                .put(update_home)
                .delete(delete_home)
                .route_layer(
                    ServiceBuilder::new()
                        .layer(from_fn_with_state(state.auth.clone(), authenticate))
                        .layer(from_fn_with_state(loader, load_resource::<HomeRow>))
                        .layer(from_fn_with_state(Rule::AdminOrSubject, authorize)),
                ),
        )
}

fn tran_routes(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/tranexample",
        post(create_tran).route_layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.auth.clone(), authenticate))
                .layer(from_fn_with_state(
                    PgBeginner::new(state.db.clone()),
                    transaction::<PgBeginner>,
                )),
        ),
    )
}
