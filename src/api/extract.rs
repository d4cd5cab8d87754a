//! Request extractors
//!
//! Rejections surface as [`EcommerceError`] so every failure shares one body shape.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{AppState, JWT_COOKIE};
use crate::domain::aggregates::User;
use crate::EcommerceError;

/// The authenticated caller, from `Authorization: Bearer` or the `jwt` cookie.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());
        let token = bearer
            .or_else(|| CookieJar::from_headers(&parts.headers).get(JWT_COOKIE).map(|c| c.value().to_string()))
            .filter(|t| !t.is_empty() && t != "loggedout")
            .ok_or_else(|| EcommerceError::unauthorized("You are not logged in! Please log in to get access."))?;

        let user = state.services.auth.authenticate(&token).await?;
        Ok(Self(user))
    }
}

/// JSON body whose parse errors become `BadRequest`.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = EcommerceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| EcommerceError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// JSON body that may be left out entirely; an empty body yields `T::default()`.
/// A body that is present but does not parse is still `BadRequest`.
pub struct OptionalJsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for OptionalJsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = EcommerceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| EcommerceError::bad_request(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| EcommerceError::bad_request(format!("Invalid request body: {e}")))
    }
}

/// Query string whose parse errors become `BadRequest`.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| EcommerceError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, EcommerceError> {
    Uuid::parse_str(raw).map_err(|_| EcommerceError::bad_request(format!("Invalid id: {raw}")))
}
