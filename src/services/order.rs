//! Order processor

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{Checkout, Order, OrderStatus, PaymentResult, User};
use crate::publisher::EventPublisher;
use crate::services::publish_all;
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_status: OrderStatus,
}

fn order_not_found() -> EcommerceError {
    EcommerceError::not_found("No order found with that ID")
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Turns the user's cart into a pending order; the cart is gone afterwards.
    pub async fn create(&self, user: &User, checkout: Checkout) -> Result<Order> {
        let mut order = self.store.checkout(user.id, checkout, Utc::now()).await?;
        info!(order_id = %order.id, user_id = %user.id, total = %order.total_price, "Order placed");
        self.publish(&mut order).await;
        Ok(order)
    }

    pub async fn my_orders(&self, user: &User) -> Result<Vec<Order>> {
        self.store.list_orders(Some(user.id)).await
    }

    pub async fn all(&self) -> Result<Vec<Order>> {
        self.store.list_orders(None).await
    }

    /// Owner or admin only.
    pub async fn get(&self, user: &User, id: Uuid) -> Result<Order> {
        let order = self.store.find_order(id).await?.ok_or_else(order_not_found)?;
        ensure_owner_or_admin(user, &order)?;
        Ok(order)
    }

    /// Moves along a legal status edge.
    pub async fn update_status(&self, id: Uuid, next: OrderStatus) -> Result<Order> {
        let mut order = self
            .store
            .update_order(id, Box::new(move |order: &mut Order| -> Result<()> {
                order.transition(next, Utc::now())?;
                Ok(())
            }))
            .await?;
        info!(order_id = %id, status = %next, "Order status updated");
        self.publish(&mut order).await;
        Ok(order)
    }

    /// Owner or admin; only before shipping.
    pub async fn cancel(&self, user: &User, id: Uuid) -> Result<Order> {
        let requester = user.clone();
        let mut order = self
            .store
            .update_order(id, Box::new(move |order: &mut Order| -> Result<()> {
                ensure_owner_or_admin(&requester, order)?;
                order.cancel(Utc::now())?;
                Ok(())
            }))
            .await?;
        info!(order_id = %id, user_id = %user.id, "Order cancelled");
        self.publish(&mut order).await;
        Ok(order)
    }

    pub async fn pay(&self, id: Uuid, result: PaymentResult) -> Result<Order> {
        let mut order = self
            .store
            .update_order(id, Box::new(move |order: &mut Order| -> Result<()> {
                order.mark_paid(result, Utc::now())?;
                Ok(())
            }))
            .await?;
        self.publish(&mut order).await;
        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_order(id).await? {
            return Err(order_not_found());
        }
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    async fn publish(&self, order: &mut Order) {
        publish_all(self.publisher.as_ref(), order.take_events()).await;
    }
}

fn ensure_owner_or_admin(user: &User, order: &Order) -> Result<()> {
    if order.is_owned_by(user.id) || user.is_admin() {
        Ok(())
    } else {
        Err(EcommerceError::forbidden("You do not have permission to access this order"))
    }
}
