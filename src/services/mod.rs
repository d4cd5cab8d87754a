//! Business operations
//!
//! Each service takes the authenticated [`User`](crate::domain::aggregates::User)
//! as an explicit argument where ownership or role matters. Events returned by
//! the store are published only after the write has committed.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod users;

use std::sync::Arc;

use tracing::warn;

use crate::config::Config;
use crate::domain::events::DomainEvent;
use crate::publisher::EventPublisher;
use crate::store::Store;

pub use auth::{AuthService, Claims};
pub use cart::{CartService, CartView};
pub use catalog::{CatalogService, ProductDetail};
pub use order::OrderService;
pub use users::UserService;

/// Every service, sharing one store and one publisher.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub catalog: CatalogService,
    pub cart: CartService,
    pub orders: OrderService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn EventPublisher>, config: Arc<Config>) -> Self {
        Self {
            auth: AuthService::new(store.clone(), publisher.clone(), config),
            users: UserService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            cart: CartService::new(store.clone()),
            orders: OrderService::new(store, publisher),
        }
    }
}

/// Publishes committed events; a broker failure is logged, not returned.
pub(crate) async fn publish_all(publisher: &dyn EventPublisher, events: Vec<DomainEvent>) {
    for event in events {
        if let Err(e) = publisher.publish(&event).await {
            warn!(subject = event.subject(), error = %e, "Failed to publish event");
        }
    }
}
