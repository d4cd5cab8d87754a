use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{parse_id, CurrentUser, JsonBody};
use super::{success, success_list, AppState};
use crate::domain::aggregates::ReviewPatch;
use crate::store::ReviewFilter;
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews))
        .route("/user", get(my_reviews))
        .route("/:id", get(get_review).patch(update_review).delete(delete_review))
}

async fn list_reviews(State(state): State<AppState>, CurrentUser(_): CurrentUser) -> Result<Json<Value>> {
    Ok(success_list("reviews", state.services.catalog.list_reviews(ReviewFilter::default()).await?))
}

async fn my_reviews(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Value>> {
    let filter = ReviewFilter { product_id: None, user_id: Some(user.id) };
    Ok(success_list("reviews", state.services.catalog.list_reviews(filter).await?))
}

async fn get_review(State(state): State<AppState>, CurrentUser(_): CurrentUser, Path(id): Path<String>) -> Result<Json<Value>> {
    let review = state.services.catalog.get_review(parse_id(&id)?).await?;
    Ok(success(json!({ "review": review })))
}

async fn update_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ReviewPatch>,
) -> Result<Json<Value>> {
    let review = state.services.catalog.update_review(&user, parse_id(&id)?, patch).await?;
    Ok(success(json!({ "review": review })))
}

async fn delete_review(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    state.services.catalog.delete_review(&user, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
