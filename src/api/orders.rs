use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{parse_id, CurrentUser, JsonBody, OptionalJsonBody};
use super::{success, success_list, AppState};
use crate::domain::aggregates::{Checkout, PaymentResult, Role};
use crate::services::auth::restrict_to;
use crate::services::order::UpdateStatusRequest;
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(all_orders).post(create_order))
        .route("/my-orders", get(my_orders))
        .route("/:id", get(get_order).patch(update_status).delete(delete_order))
        .route("/:id/cancel", patch(cancel_order))
        .route("/:id/pay", patch(pay_order))
}

async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OptionalJsonBody(checkout): OptionalJsonBody<Checkout>,
) -> Result<(StatusCode, Json<Value>)> {
    let order = state.services.orders.create(&user, checkout).await?;
    Ok((StatusCode::CREATED, success(json!({ "order": order }))))
}

async fn all_orders(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Value>> {
    restrict_to(&user, &[Role::Admin])?;
    Ok(success_list("orders", state.services.orders.all().await?))
}

async fn my_orders(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Value>> {
    Ok(success_list("orders", state.services.orders.my_orders(&user).await?))
}

async fn get_order(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<Json<Value>> {
    let order = state.services.orders.get(&user, parse_id(&id)?).await?;
    Ok(success(json!({ "order": order })))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    restrict_to(&user, &[Role::Admin])?;
    let order = state.services.orders.update_status(parse_id(&id)?, req.order_status).await?;
    Ok(success(json!({ "order": order })))
}

async fn cancel_order(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<Json<Value>> {
    let order = state.services.orders.cancel(&user, parse_id(&id)?).await?;
    Ok(success(json!({ "order": order })))
}

async fn pay_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(result): JsonBody<PaymentResult>,
) -> Result<Json<Value>> {
    restrict_to(&user, &[Role::Admin])?;
    let order = state.services.orders.pay(parse_id(&id)?, result).await?;
    Ok(success(json!({ "order": order })))
}

async fn delete_order(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    restrict_to(&user, &[Role::Admin])?;
    state.services.orders.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
