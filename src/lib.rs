//! Storefront backend
//!
//! Catalog, accounts, cart and checkout behind a JSON REST API.
//!
//! ## Features
//! - Product catalog with slugs and review-driven rating aggregates
//! - User accounts with JWT bearer/cookie authentication
//! - One persistent cart per user, with guest-cart merge
//! - Checkout into immutable order snapshots with a guarded status lifecycle
//!
//! ## Layout
//! - [`domain`]: aggregates, value objects and domain events, no I/O
//! - [`store`]: persistence traits with PostgreSQL and in-memory backends
//! - [`services`]: business operations over a store
//! - [`api`]: axum routers, extractors and the error responder

pub mod api;
pub mod config;
pub mod domain;
pub mod publisher;
pub mod services;
pub mod store;

use thiserror::Error;

pub use api::{router, AppState};
pub use config::Config;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EcommerceError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for failures caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_) | Self::Database(_))
    }
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        Self::BadRequest(format!("Invalid input data. {}", messages.join(". ")))
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;

// =============================================================================
// Domain error mapping
// =============================================================================

use domain::aggregates::{cart::CartError, order::OrderError, product::ProductError, review::ReviewError};
use domain::value_objects::{EmailError, QuantityError, RatingError, SizeError};

impl From<CartError> for EcommerceError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::CartNotFound | CartError::ItemNotFound => Self::NotFound(e.to_string()),
            CartError::Empty => Self::BadRequest(e.to_string()),
        }
    }
}

macro_rules! bad_request_from {
    ($($err:ty),* $(,)?) => {
        $(impl From<$err> for EcommerceError {
            fn from(e: $err) -> Self { Self::BadRequest(e.to_string()) }
        })*
    };
}

bad_request_from!(OrderError, ProductError, ReviewError, EmailError, QuantityError, RatingError, SizeError);
