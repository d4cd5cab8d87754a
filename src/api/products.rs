use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{parse_id, CurrentUser, JsonBody, QueryParams};
use super::{success, success_list, AppState};
use crate::domain::aggregates::{NewProduct, NewReview, ProductPatch, Role};
use crate::services::auth::restrict_to;
use crate::store::{ProductListParams, ReviewFilter};
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).patch(update_product).delete(delete_product))
        .route("/:id/reviews", get(list_product_reviews).post(create_product_review))
}

async fn list_products(State(state): State<AppState>, QueryParams(params): QueryParams<ProductListParams>) -> Result<Json<Value>> {
    Ok(success_list("products", state.services.catalog.list_products(params).await?))
}

async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(new): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Value>)> {
    restrict_to(&user, &[Role::Admin])?;
    let product = state.services.catalog.create_product(new).await?;
    Ok((StatusCode::CREATED, success(json!({ "product": product }))))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let product = state.services.catalog.product_detail(&id).await?;
    Ok(success(json!({ "product": product })))
}

async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ProductPatch>,
) -> Result<Json<Value>> {
    restrict_to(&user, &[Role::Admin])?;
    let product = state.services.catalog.update_product(&id, patch).await?;
    Ok(success(json!({ "product": product })))
}

async fn delete_product(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    restrict_to(&user, &[Role::Admin])?;
    state.services.catalog.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_product_reviews(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let filter = ReviewFilter { product_id: Some(parse_id(&id)?), user_id: None };
    Ok(success_list("reviews", state.services.catalog.list_reviews(filter).await?))
}

async fn create_product_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(new): JsonBody<NewReview>,
) -> Result<(StatusCode, Json<Value>)> {
    restrict_to(&user, &[Role::User])?;
    let review = state.services.catalog.create_review(&user, parse_id(&id)?, new).await?;
    Ok((StatusCode::CREATED, success(json!({ "review": review }))))
}
