//! Persistence layer
//!
//! One trait per aggregate family, joined into [`Store`]. Multi-document
//! sequences that must not interleave (user edits, cart read-modify-write,
//! checkout, order status changes) are single trait methods so each backend can make
//! them atomic: a transaction with row locks in PostgreSQL, one write lock in
//! memory.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Checkout, Order, Product, RatingSummary, Review, User};
use crate::domain::value_objects::{Email, Rating, Slug};
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Mutation applied to a locked, freshly read user.
pub type UserMutation = Box<dyn FnOnce(&mut User) -> Result<()> + Send>;
/// Mutation applied to a locked cart.
pub type CartMutation = Box<dyn FnOnce(&mut Cart) -> Result<()> + Send>;
/// Mutation applied to a locked order.
pub type OrderMutation = Box<dyn FnOnce(&mut Order) -> Result<()> + Send>;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductSortField { Price, RatingsAverage, CreatedAt, Name }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductSort { pub field: ProductSortField, pub descending: bool }

impl ProductSort {
    /// Parses `price,-ratingsAverage` style lists; unknown keys are rejected.
    pub fn parse_list(raw: &str) -> std::result::Result<Vec<ProductSort>, String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|key| {
                let (descending, name) = match key.strip_prefix('-') { Some(rest) => (true, rest), None => (false, key) };
                let field = match name {
                    "price" => ProductSortField::Price,
                    "ratingsAverage" => ProductSortField::RatingsAverage,
                    "createdAt" => ProductSortField::CreatedAt,
                    "name" => ProductSortField::Name,
                    other => return Err(format!("Cannot sort by `{other}`")),
                };
                Ok(ProductSort { field, descending })
            })
            .collect()
    }
}

/// Raw listing parameters as they arrive on the query string.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub category: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub sort: Vec<ProductSort>,
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self { category: None, price_gte: None, price_lte: None, sort: vec![], page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl ProductQuery {
    pub fn from_params(params: ProductListParams) -> std::result::Result<Self, String> {
        let sort = match params.sort.as_deref() { Some(raw) => ProductSort::parse_list(raw)?, None => vec![] };
        Ok(Self {
            category: params.category.filter(|c| !c.is_empty()),
            price_gte: params.price_gte,
            price_lte: params.price_lte,
            sort,
            page: params.page.unwrap_or(1).max(1),
            limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        })
    }

    pub fn offset(&self) -> u32 { (self.page - 1) * self.limit }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub product_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `BadRequest` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;
    /// Active users only.
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>>;
    async fn find_user_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>>;
    async fn find_user_by_verification_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>>;
    /// Locks an active user, applies `mutation` to the stored row and writes it back.
    /// Fails with `NotFound` for unknown or inactive users and `BadRequest` when the email is taken.
    async fn update_user(&self, id: Uuid, mutation: UserMutation) -> Result<User>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn delete_user(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn save_product(&self, product: &Product) -> Result<()>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
    /// Oldest product carrying the slug.
    async fn find_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>>;
    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>>;
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;
    async fn delete_product(&self, id: Uuid) -> Result<bool>;

    /// Fails with `BadRequest` when the user already reviewed the product.
    async fn insert_review(&self, review: &Review) -> Result<()>;
    async fn save_review(&self, review: &Review) -> Result<()>;
    async fn find_review(&self, id: Uuid) -> Result<Option<Review>>;
    async fn delete_review(&self, id: Uuid) -> Result<bool>;
    /// Newest first.
    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<Review>>;
    async fn product_ratings(&self, product_id: Uuid) -> Result<Vec<Rating>>;
    async fn set_product_ratings(&self, product_id: Uuid, summary: RatingSummary) -> Result<()>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>>;
    /// Locks the user's cart, applies `mutation` and persists the result.
    /// With `create_if_missing` an empty cart is created first; otherwise a
    /// missing cart is `NotFound`. A failing mutation persists nothing.
    async fn update_cart(&self, user_id: Uuid, create_if_missing: bool, mutation: CartMutation) -> Result<Cart>;
    async fn delete_cart(&self, user_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Snapshots the user's cart into a new order and deletes the cart, all or nothing.
    async fn checkout(&self, user_id: Uuid, checkout: Checkout, now: DateTime<Utc>) -> Result<Order>;
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;
    /// Newest first; all orders when `user_id` is `None`.
    async fn list_orders(&self, user_id: Option<Uuid>) -> Result<Vec<Order>>;
    /// Locks the order, applies `mutation` and persists the result.
    async fn update_order(&self, id: Uuid, mutation: OrderMutation) -> Result<Order>;
    async fn delete_order(&self, id: Uuid) -> Result<bool>;
}

pub trait Store: UserStore + CatalogStore + CartStore + OrderStore {}

impl<T> Store for T where T: UserStore + CatalogStore + CartStore + OrderStore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_list_parses_direction_and_rejects_unknown_fields() {
        let sort = ProductSort::parse_list("price,-ratingsAverage").unwrap();
        assert_eq!(sort, vec![
            ProductSort { field: ProductSortField::Price, descending: false },
            ProductSort { field: ProductSortField::RatingsAverage, descending: true },
        ]);
        assert!(ProductSort::parse_list("password").is_err());
    }

    #[test]
    fn paging_is_clamped() {
        let q = ProductQuery::from_params(ProductListParams { page: Some(0), limit: Some(1000), ..Default::default() }).unwrap();
        assert_eq!((q.page, q.limit, q.offset()), (1, MAX_PAGE_SIZE, 0));
        let q = ProductQuery::from_params(ProductListParams { page: Some(3), limit: Some(10), ..Default::default() }).unwrap();
        assert_eq!(q.offset(), 20);
    }
}
