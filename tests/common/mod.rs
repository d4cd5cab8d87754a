#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront::domain::aggregates::{Role, User};
use storefront::domain::events::DomainEvent;
use storefront::publisher::EventPublisher;
use storefront::store::{MemoryStore, UserStore};
use storefront::{router, AppState, Config, EcommerceError};

/// Keeps every published event for later inspection.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<&'static str> {
        self.events().iter().map(DomainEvent::subject).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> storefront::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Broker that is always down.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &DomainEvent) -> storefront::Result<()> {
        Err(EcommerceError::internal("broker unavailable"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub events: Arc<RecordingPublisher>,
}

pub struct Response {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let events = Arc::new(RecordingPublisher::default());
        Self::build(events.clone(), events)
    }

    pub fn with_publisher(publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_config(publisher, Config::for_tests())
    }

    pub fn with_config(publisher: Arc<dyn EventPublisher>, config: Config) -> Self {
        Self::build_with(publisher, Arc::new(RecordingPublisher::default()), config)
    }

    fn build(publisher: Arc<dyn EventPublisher>, events: Arc<RecordingPublisher>) -> Self {
        Self::build_with(publisher, events, Config::for_tests())
    }

    fn build_with(publisher: Arc<dyn EventPublisher>, events: Arc<RecordingPublisher>, config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), publisher, config);
        Self { router: router(state), store, events }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        Response { status, set_cookie, body }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Signs up a fresh user; returns `(token, user id)`.
    pub async fn signup(&self, email: &str) -> (String, String) {
        let res = self
            .call(
                Method::POST,
                "/api/v1/users/signup",
                None,
                Some(json!({
                    "fullName": "Test Shopper",
                    "email": email,
                    "phoneNumber": "08030000000",
                    "address": "3 Herbert Macaulay Way, Yaba",
                    "password": "password123",
                    "passwordConfirm": "password123",
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "signup failed: {}", res.body);
        (res.body["token"].as_str().unwrap().to_string(), res.body["data"]["user"]["id"].as_str().unwrap().to_string())
    }

    /// Signs up a user and promotes it to admin directly in the store.
    pub async fn admin(&self, email: &str) -> String {
        let (token, id) = self.signup(email).await;
        self.store
            .update_user(Uuid::parse_str(&id).unwrap(), Box::new(|user: &mut User| -> storefront::Result<()> {
                user.role = Role::Admin;
                Ok(())
            }))
            .await
            .unwrap();
        token
    }

    /// Creates a product as `admin`; returns its id.
    pub async fn product(&self, admin: &str, name: &str, price: f64, discount: f64, stock: u32) -> String {
        let res = self
            .call(
                Method::POST,
                "/api/v1/products",
                Some(admin),
                Some(json!({
                    "name": name,
                    "description": format!("{name} description"),
                    "price": price,
                    "priceDiscount": discount,
                    "category": "apparel",
                    "stockNo": stock,
                    "imageUrl": "https://cdn.example.com/p.png",
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "product create failed: {}", res.body);
        res.body["data"]["product"]["id"].as_str().unwrap().to_string()
    }

    pub async fn add_to_cart(&self, token: &str, product_id: &str, quantity: u32) -> Response {
        self.call(Method::POST, "/api/v1/cart", Some(token), Some(json!({ "productId": product_id, "quantity": quantity })))
            .await
    }
}
