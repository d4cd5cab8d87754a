use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

use super::extract::{parse_id, CurrentUser, JsonBody};
use super::{success, success_list, AppState, JWT_COOKIE};
use crate::domain::aggregates::{Role, UserPatch};
use crate::services::auth::{
    restrict_to, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, Session, SignupRequest, UpdatePasswordRequest,
};
use crate::services::users::UpdateMeRequest;
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/:token", patch(reset_password))
        .route("/verifyEmail/:token", patch(verify_email))
        .route("/updateMyPassword", patch(update_password))
        .route("/me", get(get_me).patch(update_me))
        .route("/updateMe", patch(update_me))
        .route("/deleteMe", delete(delete_me))
        .route("/", get(list_users))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

/// Sets the `jwt` cookie and answers `{status, token, data: {user}}`.
fn session_response(state: &AppState, jar: CookieJar, status: StatusCode, session: Session) -> impl IntoResponse {
    let cookie = Cookie::build((JWT_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production())
        .max_age(time::Duration::days(state.config.jwt_cookie_expires_in_days));
    let body = Json(json!({ "status": "success", "token": session.token, "data": { "user": session.user } }));
    (status, jar.add(cookie), body)
}

async fn signup(State(state): State<AppState>, jar: CookieJar, JsonBody(req): JsonBody<SignupRequest>) -> Result<impl IntoResponse> {
    let session = state.services.auth.signup(req).await?;
    Ok(session_response(&state, jar, StatusCode::CREATED, session))
}

async fn login(State(state): State<AppState>, jar: CookieJar, JsonBody(req): JsonBody<LoginRequest>) -> Result<impl IntoResponse> {
    let session = state.services.auth.login(req).await?;
    Ok(session_response(&state, jar, StatusCode::OK, session))
}

/// Overwrites the cookie with a short-lived placeholder the extractor ignores.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((JWT_COOKIE, "loggedout"))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(10));
    (jar.add(cookie), Json(json!({ "status": "success" })))
}

async fn forgot_password(State(state): State<AppState>, JsonBody(req): JsonBody<ForgotPasswordRequest>) -> Result<Json<Value>> {
    state.services.auth.forgot_password(&req.email).await?;
    Ok(Json(json!({ "status": "success", "message": "Token sent to email!" })))
}

async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    let session = state.services.auth.reset_password(&token, req).await?;
    Ok(session_response(&state, jar, StatusCode::OK, session))
}

async fn verify_email(State(state): State<AppState>, Path(token): Path<String>) -> Result<Json<Value>> {
    let user = state.services.auth.verify_email(&token).await?;
    Ok(success(json!({ "user": user })))
}

async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    JsonBody(req): JsonBody<UpdatePasswordRequest>,
) -> Result<impl IntoResponse> {
    let session = state.services.auth.update_password(&user, req).await?;
    Ok(session_response(&state, jar, StatusCode::OK, session))
}

async fn get_me(CurrentUser(user): CurrentUser) -> Json<Value> {
    success(json!({ "user": user }))
}

async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<UpdateMeRequest>,
) -> Result<Json<Value>> {
    let user = state.services.users.update_me(&user, req).await?;
    Ok(success(json!({ "user": user })))
}

async fn delete_me(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<StatusCode> {
    state.services.users.deactivate(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Value>> {
    restrict_to(&user, &[Role::Admin])?;
    Ok(success_list("users", state.services.users.list().await?))
}

async fn get_user(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<Json<Value>> {
    restrict_to(&user, &[Role::Admin])?;
    let found = state.services.users.get(parse_id(&id)?).await?;
    Ok(success(json!({ "user": found })))
}

async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<Value>> {
    restrict_to(&user, &[Role::Admin])?;
    let updated = state.services.users.update(parse_id(&id)?, patch).await?;
    Ok(success(json!({ "user": updated })))
}

async fn delete_user(State(state): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    restrict_to(&user, &[Role::Admin])?;
    state.services.users.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
