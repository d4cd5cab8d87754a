//! Domain events
use crate::domain::aggregates::OrderStatus;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "lowercase")]
pub enum DomainEvent {
    User(UserEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserEvent {
    #[serde(rename_all = "camelCase")]
    Registered { user_id: Uuid, email: String, verification_url: String },
    #[serde(rename_all = "camelCase")]
    PasswordResetRequested { user_id: Uuid, email: String, reset_url: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OrderEvent {
    #[serde(rename_all = "camelCase")]
    Placed { order_id: Uuid, user_id: Uuid, total: Decimal },
    #[serde(rename_all = "camelCase")]
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
    #[serde(rename_all = "camelCase")]
    Cancelled { order_id: Uuid, user_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Paid { order_id: Uuid },
}

impl DomainEvent {
    /// Dotted routing key, e.g. `order.placed`.
    pub fn subject(&self) -> &'static str {
        match self {
            DomainEvent::User(UserEvent::Registered { .. }) => "user.registered",
            DomainEvent::User(UserEvent::PasswordResetRequested { .. }) => "user.password_reset_requested",
            DomainEvent::Order(OrderEvent::Placed { .. }) => "order.placed",
            DomainEvent::Order(OrderEvent::StatusChanged { .. }) => "order.status_changed",
            DomainEvent::Order(OrderEvent::Cancelled { .. }) => "order.cancelled",
            DomainEvent::Order(OrderEvent::Paid { .. }) => "order.paid",
        }
    }
}
