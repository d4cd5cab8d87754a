//! PostgreSQL store
//!
//! Carts and order snapshots live in `JSONB` columns, so each is still read and
//! written as one document. Multi-row sequences run inside a transaction with
//! `FOR UPDATE` row locks.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{CartMutation, CartStore, CatalogStore, OrderMutation, OrderStore, ProductQuery, ProductSortField, ReviewFilter, UserMutation, UserStore};
use crate::domain::aggregates::{Cart, CartError, CartItem, Checkout, Order, OrderItem, OrderStatus, PaymentResult, Product, RatingSummary, Review, User};
use crate::domain::value_objects::{Email, Rating, Slug};
use crate::{EcommerceError, Result};

const USER_COLUMNS: &str = "id, full_name, email, phone_number, address, avatar, role, email_verified, password_hash, \
    password_changed_at, password_reset_token, password_reset_expires_at, email_verification_token, \
    email_verification_expires_at, active, created_at, updated_at";
const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, price_discount, category, stock_no, image_url, \
    ratings_average, ratings_quantity, created_at, updated_at";
const REVIEW_COLUMNS: &str = "id, product_id, user_id, review, rating, created_at, updated_at";
const CART_COLUMNS: &str = "id, user_id, items, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, order_items, shipping_address, payment_method, payment_result, total_price, \
    order_status, paid_at, delivered_at, cancelled_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| EcommerceError::internal(format!("migration failed: {e}")))?;
        Ok(Self::new(pool))
    }
}

fn unique_violation(err: sqlx::Error, message: &str) -> EcommerceError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => EcommerceError::bad_request(message),
        _ => err.into(),
    }
}

fn stock_column(stock_no: u32) -> Result<i32> {
    i32::try_from(stock_no).map_err(|_| EcommerceError::bad_request(format!("Stock cannot exceed {}", i32::MAX)))
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> EcommerceError {
    EcommerceError::internal(format!("corrupt {what} row: {detail}"))
}

// =============================================================================
// Row types
// =============================================================================

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone_number: String,
    address: Option<String>,
    avatar: Option<String>,
    role: String,
    email_verified: String,
    password_hash: String,
    password_changed_at: Option<DateTime<Utc>>,
    password_reset_token: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    email_verification_token: Option<String>,
    email_verification_expires_at: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = EcommerceError;

    fn try_from(r: UserRow) -> Result<Self> {
        Ok(User {
            id: r.id,
            full_name: r.full_name,
            email: Email::parse(&r.email).map_err(|e| corrupt("user", e))?,
            phone_number: r.phone_number,
            address: r.address,
            avatar: r.avatar,
            role: r.role.parse().map_err(|e| corrupt("user", e))?,
            email_verified: r.email_verified.parse().map_err(|e| corrupt("user", e))?,
            password_hash: r.password_hash,
            password_changed_at: r.password_changed_at,
            password_reset_token: r.password_reset_token,
            password_reset_expires_at: r.password_reset_expires_at,
            email_verification_token: r.email_verification_token,
            email_verification_expires_at: r.email_verification_expires_at,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    price_discount: Decimal,
    category: String,
    stock_no: i32,
    image_url: String,
    ratings_average: f64,
    ratings_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            slug: Slug::from_stored(r.slug),
            description: r.description,
            price: r.price,
            price_discount: r.price_discount,
            category: r.category,
            stock_no: r.stock_no.max(0) as u32,
            image_url: r.image_url,
            ratings_average: r.ratings_average,
            ratings_quantity: r.ratings_quantity.max(0) as u32,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    review: String,
    rating: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn rating_from_column(value: i16) -> Result<Rating> {
    u8::try_from(value)
        .ok()
        .and_then(|v| Rating::new(v).ok())
        .ok_or_else(|| corrupt("review", format!("rating {value}")))
}

impl TryFrom<ReviewRow> for Review {
    type Error = EcommerceError;

    fn try_from(r: ReviewRow) -> Result<Self> {
        Ok(Review {
            id: r.id,
            product_id: r.product_id,
            user_id: r.user_id,
            review: r.review,
            rating: rating_from_column(r.rating)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    items: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Cart::restore(r.id, r.user_id, r.items.0, r.created_at, r.updated_at)
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    order_items: Json<Vec<OrderItem>>,
    shipping_address: String,
    payment_method: String,
    payment_result: Option<Json<PaymentResult>>,
    total_price: Decimal,
    order_status: String,
    paid_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = EcommerceError;

    fn try_from(r: OrderRow) -> Result<Self> {
        let status: OrderStatus = r.order_status.parse().map_err(|e| corrupt("order", e))?;
        Ok(Order::restore(
            r.id, r.user_id, r.order_items.0, r.shipping_address, r.payment_method,
            r.payment_result.map(|j| j.0), r.total_price, status,
            r.paid_at, r.delivered_at, r.cancelled_at, r.created_at, r.updated_at,
        ))
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        ))
        .bind(user.id)
        .bind(&user.full_name)
        .bind(user.email.as_str())
        .bind(&user.phone_number)
        .bind(&user.address)
        .bind(&user.avatar)
        .bind(user.role.as_str())
        .bind(user.email_verified.as_str())
        .bind(&user.password_hash)
        .bind(user.password_changed_at)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires_at)
        .bind(&user.email_verification_token)
        .bind(user.email_verification_expires_at)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Email already in use. Please use another email"))?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND active"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND active"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE password_reset_token = $1 AND password_reset_expires_at > $2 AND active"
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_user_by_verification_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email_verification_token = $1 AND email_verification_expires_at > $2 AND active"
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn update_user(&self, id: Uuid, mutation: UserMutation) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let mut user: User = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND active FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| EcommerceError::not_found("No user found with that ID"))?
            .try_into()?;

        mutation(&mut user)?;

        sqlx::query(
            r#"
            UPDATE users SET
                full_name = $2, email = $3, phone_number = $4, address = $5, avatar = $6, role = $7,
                email_verified = $8, password_hash = $9, password_changed_at = $10,
                password_reset_token = $11, password_reset_expires_at = $12,
                email_verification_token = $13, email_verification_expires_at = $14,
                active = $15, updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(user.email.as_str())
        .bind(&user.phone_number)
        .bind(&user.address)
        .bind(&user.avatar)
        .bind(user.role.as_str())
        .bind(user.email_verified.as_str())
        .bind(&user.password_hash)
        .bind(user.password_changed_at)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires_at)
        .bind(&user.email_verification_token)
        .bind(user.email_verification_expires_at)
        .bind(user.active)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Email already in use. Please use another email"))?;

        tx.commit().await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE active ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Products & reviews
// =============================================================================

fn sort_column(field: ProductSortField) -> &'static str {
    match field {
        ProductSortField::Price => "price",
        ProductSortField::RatingsAverage => "ratings_average",
        ProductSortField::CreatedAt => "created_at",
        ProductSortField::Name => "name",
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.price)
        .bind(product.price_discount)
        .bind(&product.category)
        .bind(stock_column(product.stock_no)?)
        .bind(&product.image_url)
        .bind(product.ratings_average)
        .bind(product.ratings_quantity as i32)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2, slug = $3, description = $4, price = $5, price_discount = $6,
                category = $7, stock_no = $8, image_url = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.price)
        .bind(product.price_discount)
        .bind(&product.category)
        .bind(stock_column(product.stock_no)?)
        .bind(&product.image_url)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EcommerceError::not_found("No product found with that ID"));
        }
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn find_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1 ORDER BY created_at, id LIMIT 1"
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        if let Some(category) = &query.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(min) = query.price_gte {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = query.price_lte {
            qb.push(" AND price <= ").push_bind(max);
        }

        qb.push(" ORDER BY ");
        if query.sort.is_empty() {
            qb.push("created_at DESC, id DESC");
        } else {
            for key in &query.sort {
                qb.push(sort_column(key.field)).push(if key.descending { " DESC, " } else { " ASC, " });
            }
            qb.push("id ASC");
        }
        qb.push(" LIMIT ").push_bind(i64::from(query.limit));
        qb.push(" OFFSET ").push_bind(i64::from(query.offset()));

        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        sqlx::query(&format!("INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"))
            .bind(review.id)
            .bind(review.product_id)
            .bind(review.user_id)
            .bind(&review.review)
            .bind(i16::from(review.rating.value()))
            .bind(review.created_at)
            .bind(review.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "You have already reviewed this product"))?;
        Ok(())
    }

    async fn save_review(&self, review: &Review) -> Result<()> {
        let result = sqlx::query("UPDATE reviews SET review = $2, rating = $3, updated_at = $4 WHERE id = $1")
            .bind(review.id)
            .bind(&review.review)
            .bind(i16::from(review.rating.value()))
            .bind(review.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EcommerceError::not_found("No review found with that ID"));
        }
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>> {
        sqlx::query_as::<_, ReviewRow>(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Review::try_from)
            .transpose()
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<Review>> {
        sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE ($1::uuid IS NULL OR product_id = $1) AND ($2::uuid IS NULL OR user_id = $2) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.product_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Review::try_from)
        .collect()
    }

    async fn product_ratings(&self, product_id: Uuid) -> Result<Vec<Rating>> {
        let ratings: Vec<i16> = sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        ratings.into_iter().map(rating_from_column).collect()
    }

    async fn set_product_ratings(&self, product_id: Uuid, summary: RatingSummary) -> Result<()> {
        sqlx::query("UPDATE products SET ratings_average = $2, ratings_quantity = $3 WHERE id = $1")
            .bind(product_id)
            .bind(summary.average)
            .bind(summary.quantity as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Carts
// =============================================================================

#[async_trait]
impl CartStore for PgStore {
    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(&format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Cart::from))
    }

    async fn update_cart(&self, user_id: Uuid, create_if_missing: bool, mutation: CartMutation) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;

        if create_if_missing {
            // The unique user_id index makes concurrent first adds converge on one cart.
            let now = Utc::now();
            sqlx::query(
                "INSERT INTO carts (id, user_id, items, created_at, updated_at) VALUES ($1, $2, '[]'::jsonb, $3, $3) \
                 ON CONFLICT (user_id) DO NOTHING",
            )
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let mut cart: Cart = sqlx::query_as::<_, CartRow>(&format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 FOR UPDATE"))
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(Cart::from)
            .ok_or(CartError::CartNotFound)?;

        mutation(&mut cart)?;

        sqlx::query("UPDATE carts SET items = $2, updated_at = $3 WHERE id = $1")
            .bind(cart.id())
            .bind(Json(cart.items().to_vec()))
            .bind(cart.updated_at())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn delete_cart(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Orders
// =============================================================================

async fn write_order(tx: &mut sqlx::Transaction<'_, Postgres>, order: &Order, insert: bool) -> Result<()> {
    let sql = if insert {
        format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)")
    } else {
        "UPDATE orders SET user_id = $2, order_items = $3, shipping_address = $4, payment_method = $5, \
         payment_result = $6, total_price = $7, order_status = $8, paid_at = $9, delivered_at = $10, \
         cancelled_at = $11, created_at = $12, updated_at = $13 WHERE id = $1"
            .to_string()
    };
    sqlx::query(&sql)
        .bind(order.id)
        .bind(order.user_id)
        .bind(Json(order.order_items.clone()))
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(order.payment_result.clone().map(Json))
        .bind(order.total_price)
        .bind(order.status().as_str())
        .bind(order.paid_at)
        .bind(order.delivered_at)
        .bind(order.cancelled_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn checkout(&self, user_id: Uuid, checkout: Checkout, now: DateTime<Utc>) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let cart = sqlx::query_as::<_, CartRow>(&format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 FOR UPDATE"))
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(Cart::from)
            .filter(|cart| !cart.is_empty())
            .ok_or(CartError::Empty)?;

        let user: User = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND active"))
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| EcommerceError::not_found("User not found"))?
            .try_into()?;

        let ids: Vec<Uuid> = cart.items().iter().map(|item| item.product_id).collect();
        let products: HashMap<Uuid, Product> =
            sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) FOR SHARE"))
                .bind(&ids)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(|row| (row.id, Product::from(row)))
                .collect();

        let order = Order::place(&user, &cart, &products, checkout, now)?;
        write_order(&mut tx, &order, true).await?;
        sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart.id()).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn list_orders(&self, user_id: Option<Uuid>) -> Result<Vec<Order>> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect()
    }

    async fn update_order(&self, id: Uuid, mutation: OrderMutation) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order: Order = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| EcommerceError::not_found("Order not found"))?
            .try_into()?;

        mutation(&mut order)?;
        write_order(&mut tx, &order, false).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
