use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{parse_id, CurrentUser, JsonBody};
use super::{success, AppState};
use crate::services::cart::{AddItemRequest, MergeRequest, UpdateQuantityRequest, UpdateSizeRequest};
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_item).delete(clear_cart))
        .route("/merge", post(merge))
        .route("/update-size/:id", patch(update_size))
        .route("/:id", patch(update_item).delete(remove_item))
}

async fn get_cart(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Value>> {
    let cart = state.services.cart.get_cart(&user).await?;
    Ok(success(json!({ "cart": cart })))
}

async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<AddItemRequest>,
) -> Result<Json<Value>> {
    let cart = state.services.cart.add_item(&user, req).await?;
    Ok(success(json!({ "cart": cart })))
}

async fn clear_cart(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<StatusCode> {
    state.services.cart.clear(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn merge(State(state): State<AppState>, CurrentUser(user): CurrentUser, JsonBody(req): JsonBody<MergeRequest>) -> Result<Json<Value>> {
    let cart = state.services.cart.merge(&user, req.items).await?;
    Ok(success(json!({ "cart": cart })))
}

async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateQuantityRequest>,
) -> Result<Json<Value>> {
    let cart = state.services.cart.update_item(&user, parse_id(&id)?, req.quantity).await?;
    Ok(success(json!({ "cart": cart })))
}

async fn update_size(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateSizeRequest>,
) -> Result<Json<Value>> {
    let cart = state.services.cart.update_size(&user, parse_id(&id)?, req.size).await?;
    Ok(success(json!({ "cart": cart })))
}

async fn remove_item(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<Json<Value>> {
    let cart = state.services.cart.remove_item(&user, parse_id(&id)?).await?;
    Ok(success(json!({ "cart": cart })))
}
