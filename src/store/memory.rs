//! In-process store backed by hash maps behind one async `RwLock`.
//!
//! Every trait method takes the lock once, so each call is atomic with respect
//! to every other call.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartMutation, CartStore, CatalogStore, OrderMutation, OrderStore, ProductQuery, ProductSortField, ReviewFilter, UserMutation, UserStore};
use crate::domain::aggregates::{Cart, CartError, Checkout, Order, Product, RatingSummary, Review, User};
use crate::domain::value_objects::{Email, Rating, Slug};
use crate::{EcommerceError, Result};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    reviews: HashMap<Uuid, Review>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, Order>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

fn without_events(order: &Order) -> Order {
    let mut stored = order.clone();
    stored.take_events();
    stored
}

fn email_taken(inner: &Inner, email: &Email, except: Uuid) -> bool {
    inner.users.values().any(|u| u.id != except && &u.email == email)
}

fn compare_products(a: &Product, b: &Product, query: &ProductQuery) -> Ordering {
    if query.sort.is_empty() {
        return b.created_at.cmp(&a.created_at);
    }
    for key in &query.sort {
        let ord = match key.field {
            ProductSortField::Price => a.price.cmp(&b.price),
            ProductSortField::RatingsAverage => a.ratings_average.total_cmp(&b.ratings_average),
            ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSortField::Name => a.name.cmp(&b.name),
        };
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal { return ord; }
    }
    a.id.cmp(&b.id)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;
        if email_taken(&inner, &user.email, user.id) {
            return Err(EcommerceError::bad_request("Email already in use. Please use another email"));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).filter(|u| u.active).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.values().find(|u| u.active && &u.email == email).cloned())
    }

    async fn find_user_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.values()
            .find(|u| u.active && u.password_reset_token.as_deref() == Some(token_hash) && u.password_reset_expires_at.is_some_and(|exp| exp > now))
            .cloned())
    }

    async fn find_user_by_verification_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.values()
            .find(|u| u.active && u.email_verification_token.as_deref() == Some(token_hash) && u.email_verification_expires_at.is_some_and(|exp| exp > now))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, mutation: UserMutation) -> Result<User> {
        let mut inner = self.inner.write().await;
        let mut user = inner.users.get(&id).filter(|u| u.active).cloned()
            .ok_or_else(|| EcommerceError::not_found("No user found with that ID"))?;
        mutation(&mut user)?;
        if email_taken(&inner, &user.email, id) {
            return Err(EcommerceError::bad_request("Email already in use. Please use another email"));
        }
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.inner.read().await.users.values().filter(|u| u.active).cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.inner.write().await.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.products.get_mut(&product.id) {
            Some(stored) => { *stored = product.clone(); Ok(()) }
            None => Err(EcommerceError::not_found("No product found with that ID")),
        }
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn find_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.values()
            .filter(|p| &p.slug == slug)
            .min_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.products.get(id).cloned()).collect())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner.products.values()
            .filter(|p| query.category.as_ref().map_or(true, |c| &p.category == c))
            .filter(|p| query.price_gte.map_or(true, |min| p.price >= min))
            .filter(|p| query.price_lte.map_or(true, |max| p.price <= max))
            .cloned()
            .collect();
        products.sort_by(|a, b| compare_products(a, b, query));
        Ok(products.into_iter().skip(query.offset() as usize).take(query.limit as usize).collect())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.products.remove(&id).is_some();
        if removed {
            inner.reviews.retain(|_, r| r.product_id != id);
        }
        Ok(removed)
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.reviews.values().any(|r| r.product_id == review.product_id && r.user_id == review.user_id) {
            return Err(EcommerceError::bad_request("You have already reviewed this product"));
        }
        inner.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn save_review(&self, review: &Review) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.reviews.get_mut(&review.id) {
            Some(stored) => { *stored = review.clone(); Ok(()) }
            None => Err(EcommerceError::not_found("No review found with that ID")),
        }
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.reviews.remove(&id).is_some())
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<Review>> {
        let mut reviews: Vec<Review> = self.inner.read().await.reviews.values()
            .filter(|r| filter.product_id.map_or(true, |id| r.product_id == id))
            .filter(|r| filter.user_id.map_or(true, |id| r.user_id == id))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn product_ratings(&self, product_id: Uuid) -> Result<Vec<Rating>> {
        Ok(self.inner.read().await.reviews.values().filter(|r| r.product_id == product_id).map(|r| r.rating).collect())
    }

    async fn set_product_ratings(&self, product_id: Uuid, summary: RatingSummary) -> Result<()> {
        if let Some(product) = self.inner.write().await.products.get_mut(&product_id) {
            product.apply_ratings(summary);
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>> {
        Ok(self.inner.read().await.carts.get(&user_id).cloned())
    }

    async fn update_cart(&self, user_id: Uuid, create_if_missing: bool, mutation: CartMutation) -> Result<Cart> {
        let mut inner = self.inner.write().await;
        let mut cart = match inner.carts.get(&user_id) {
            Some(cart) => cart.clone(),
            None if create_if_missing => Cart::for_user(user_id, Utc::now()),
            None => return Err(CartError::CartNotFound.into()),
        };
        mutation(&mut cart)?;
        inner.carts.insert(user_id, cart.clone());
        Ok(cart)
    }

    async fn delete_cart(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.carts.remove(&user_id).is_some())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn checkout(&self, user_id: Uuid, checkout: Checkout, now: DateTime<Utc>) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let cart = match inner.carts.get(&user_id) {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(CartError::Empty.into()),
        };
        let user = inner.users.get(&user_id).filter(|u| u.active).ok_or_else(|| EcommerceError::not_found("User not found"))?;
        let products: HashMap<Uuid, Product> = cart.items().iter()
            .filter_map(|item| inner.products.get(&item.product_id).map(|p| (p.id, p.clone())))
            .collect();

        let order = Order::place(user, cart, &products, checkout, now)?;
        inner.orders.insert(order.id, without_events(&order));
        inner.carts.remove(&user_id);
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, user_id: Option<Uuid>) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.inner.read().await.orders.values()
            .filter(|o| user_id.map_or(true, |id| o.user_id == id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_order(&self, id: Uuid, mutation: OrderMutation) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let mut order = inner.orders.get(&id).cloned().ok_or_else(|| EcommerceError::not_found("Order not found"))?;
        mutation(&mut order)?;
        inner.orders.insert(id, without_events(&order));
        Ok(order)
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.orders.remove(&id).is_some())
    }
}
