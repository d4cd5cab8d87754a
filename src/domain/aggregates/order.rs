//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::aggregates::{Cart, Product, ProductError, User};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Size;

pub const DEFAULT_PAYMENT_METHOD: &str = "Pay on delivery";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
    pub total_price: Decimal,
    pub order_status: OrderStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Line captured at checkout; a copy, not a live product reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "product")]
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}

/// Caller-supplied checkout options.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Processing => "processing", Self::Shipped => "shipped",
            Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }

    /// Legal edges: forward one step at a time, or cancellation before shipping.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) | (Pending, Cancelled) | (Processing, Cancelled)
        )
    }

    pub fn is_cancellable(&self) -> bool { self.can_transition_to(OrderStatus::Cancelled) }
}

impl FromStr for OrderStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending), "processing" => Ok(Self::Processing), "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered), "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Order {
    /// Snapshots `cart` against live `products` into a new pending order.
    pub fn place(user: &User, cart: &Cart, products: &HashMap<Uuid, Product>, checkout: Checkout, now: DateTime<Utc>) -> Result<Self, OrderError> {
        if cart.is_empty() { return Err(OrderError::EmptyCart); }

        let mut order_items = Vec::with_capacity(cart.item_count());
        for item in cart.items() {
            let product = products.get(&item.product_id).ok_or(OrderError::ProductUnavailable(item.product_id))?;
            product.ensure_available(item.quantity)?;
            order_items.push(OrderItem {
                product_id: product.id, name: product.name.clone(), price: product.unit_price(),
                quantity: item.quantity.value(), size: item.size,
            });
        }
        let total_price: Decimal = order_items.iter().map(OrderItem::line_total).sum();

        let shipping_address = checkout.shipping_address.filter(|a| !a.trim().is_empty())
            .or_else(|| user.address.clone())
            .unwrap_or_default();
        let payment_method = checkout.payment_method.filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        let mut order = Self {
            id: Uuid::now_v7(), user_id: user.id, order_items, shipping_address, payment_method,
            payment_result: None, total_price, order_status: OrderStatus::Pending, paid_at: None,
            delivered_at: None, cancelled_at: None, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: order.id, user_id: order.user_id, total: total_price }));
        Ok(order)
    }

    /// Rebuilds an order from storage; carries no pending events.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid, user_id: Uuid, order_items: Vec<OrderItem>, shipping_address: String, payment_method: String,
        payment_result: Option<PaymentResult>, total_price: Decimal, order_status: OrderStatus,
        paid_at: Option<DateTime<Utc>>, delivered_at: Option<DateTime<Utc>>, cancelled_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id, user_id, order_items, shipping_address, payment_method, payment_result, total_price, order_status,
            paid_at, delivered_at, cancelled_at, created_at, updated_at, events: vec![],
        }
    }

    pub fn status(&self) -> OrderStatus { self.order_status }
    pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }

    /// Moves along a legal edge; stamps `delivered_at` / `cancelled_at` as appropriate.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
        let from = self.order_status;
        if !from.can_transition_to(next) {
            return Err(OrderError::IllegalTransition { from, to: next });
        }
        self.order_status = next;
        match next {
            OrderStatus::Delivered => self.delivered_at = Some(now),
            OrderStatus::Cancelled => self.cancelled_at = Some(now),
            _ => {}
        }
        self.touch(now);
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, from, to: next }));
        if next == OrderStatus::Cancelled {
            self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id, user_id: self.user_id }));
        }
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.order_status.is_cancellable() { return Err(OrderError::CannotCancel(self.order_status)); }
        self.transition(OrderStatus::Cancelled, now)
    }

    pub fn mark_paid(&mut self, result: PaymentResult, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.order_status == OrderStatus::Cancelled { return Err(OrderError::CannotPay(self.order_status)); }
        if self.paid_at.is_some() { return Err(OrderError::AlreadyPaid); }
        self.payment_result = Some(result);
        self.paid_at = Some(now);
        self.touch(now);
        self.raise_event(DomainEvent::Order(OrderEvent::Paid { order_id: self.id }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self, now: DateTime<Utc>) { self.updated_at = now; }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderError {
    EmptyCart,
    ProductUnavailable(Uuid),
    Inventory(ProductError),
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    CannotCancel(OrderStatus),
    CannotPay(OrderStatus),
    AlreadyPaid,
}

impl From<ProductError> for OrderError {
    fn from(e: ProductError) -> Self { Self::Inventory(e) }
}

impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCart => write!(f, "Your cart is empty"),
            Self::ProductUnavailable(id) => write!(f, "Product {id} is no longer available"),
            Self::Inventory(e) => write!(f, "{e}"),
            Self::IllegalTransition { from, to } => write!(f, "Cannot move an order from {from} to {to}"),
            Self::CannotCancel(status) => write!(f, "You cannot cancel an order that is already {status}"),
            Self::CannotPay(status) => write!(f, "You cannot pay for an order that is {status}"),
            Self::AlreadyPaid => write!(f, "Order is already paid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewProduct, NewUser};
    use crate::domain::value_objects::{Email, Quantity};

    fn user() -> User {
        User::register(NewUser {
            full_name: "Tunde Bello".into(), email: Email::parse("tunde@example.com").unwrap(),
            phone_number: "0802".into(), address: Some("4 Allen Ave, Ikeja".into()), password_hash: "x".into(),
        }, Utc::now())
    }

    fn product(name: &str, price: i64, discount: i64, stock: u32) -> Product {
        Product::create(NewProduct {
            name: name.into(), description: "d".into(), price: Decimal::new(price, 0),
            price_discount: Decimal::new(discount, 0), category: "c".into(), stock_no: stock, image_url: "i".into(),
        }, Utc::now()).unwrap()
    }

    fn placed() -> Order {
        let u = user();
        let shoe = product("Runner", 100, 80, 10);
        let cap = product("Cap", 15, 0, 10);
        let mut cart = Cart::for_user(u.id, Utc::now());
        cart.add_item(shoe.id, Quantity::new(2).unwrap(), Some(Size::W42), Utc::now());
        cart.add_item(cap.id, Quantity::new(3).unwrap(), None, Utc::now());
        let products = HashMap::from([(shoe.id, shoe), (cap.id, cap)]);
        Order::place(&u, &cart, &products, Checkout::default(), Utc::now()).unwrap()
    }

    #[test]
    fn test_order_workflow() {
        let mut order = placed();
        assert_eq!(order.total_price, Decimal::new(2 * 80 + 3 * 15, 0));
        assert_eq!(order.shipping_address, "4 Allen Ave, Ikeja");
        assert_eq!(order.payment_method, DEFAULT_PAYMENT_METHOD);
        assert_eq!(order.order_items[0].size, Some(Size::W42));
        let events = order.take_events();
        assert!(matches!(events.as_slice(), [DomainEvent::Order(OrderEvent::Placed { .. })]));

        order.transition(OrderStatus::Processing, Utc::now()).unwrap();
        order.transition(OrderStatus::Shipped, Utc::now()).unwrap();
        assert!(order.delivered_at.is_none());
        order.transition(OrderStatus::Delivered, Utc::now()).unwrap();
        assert!(order.delivered_at.is_some());
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut order = placed();
        let err = order.transition(OrderStatus::Delivered, Utc::now()).unwrap_err();
        assert_eq!(err, OrderError::IllegalTransition { from: OrderStatus::Pending, to: OrderStatus::Delivered });
        assert!(order.transition(OrderStatus::Pending, Utc::now()).is_err());
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_cancel_rules() {
        let mut order = placed();
        order.transition(OrderStatus::Processing, Utc::now()).unwrap();
        order.cancel(Utc::now()).unwrap();
        assert!(order.cancelled_at.is_some());
        assert_eq!(order.cancel(Utc::now()), Err(OrderError::CannotCancel(OrderStatus::Cancelled)));

        let mut shipped = placed();
        shipped.transition(OrderStatus::Processing, Utc::now()).unwrap();
        shipped.transition(OrderStatus::Shipped, Utc::now()).unwrap();
        assert_eq!(shipped.cancel(Utc::now()), Err(OrderError::CannotCancel(OrderStatus::Shipped)));
    }

    #[test]
    fn test_empty_cart_cannot_be_placed() {
        let u = user();
        let cart = Cart::for_user(u.id, Utc::now());
        assert_eq!(Order::place(&u, &cart, &HashMap::new(), Checkout::default(), Utc::now()).unwrap_err(), OrderError::EmptyCart);
    }

    #[test]
    fn test_checkout_rechecks_stock() {
        let u = user();
        let p = product("Scarf", 20, 0, 1);
        let mut cart = Cart::for_user(u.id, Utc::now());
        cart.add_item(p.id, Quantity::new(2).unwrap(), None, Utc::now());
        let products = HashMap::from([(p.id, p)]);
        assert!(matches!(Order::place(&u, &cart, &products, Checkout::default(), Utc::now()), Err(OrderError::Inventory(_))));
    }

    #[test]
    fn test_pay_once() {
        let mut order = placed();
        let result = PaymentResult { id: "ch_1".into(), status: "succeeded".into(), update_time: "now".into(), email_address: "t@example.com".into() };
        order.mark_paid(result.clone(), Utc::now()).unwrap();
        assert_eq!(order.mark_paid(result, Utc::now()), Err(OrderError::AlreadyPaid));
    }
}
