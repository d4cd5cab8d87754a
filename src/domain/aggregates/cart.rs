//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Quantity, Size};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// One entry of an anonymous pre-login cart.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestItem {
    pub product_id: Uuid,
    pub quantity: Quantity,
    #[serde(default)]
    pub size: Option<Size>,
}

impl Cart {
    pub fn for_user(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self { id: Uuid::now_v7(), user_id, items: vec![], created_at: now, updated_at: now }
    }

    /// Rebuilds a cart from storage.
    pub fn restore(id: Uuid, user_id: Uuid, items: Vec<CartItem>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self { id, user_id, items, created_at, updated_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<Quantity> {
        self.items.iter().find(|i| i.product_id == product_id).map(|i| i.quantity)
    }

    /// Quantity the line for `product_id` would hold after adding `quantity`.
    pub fn quantity_after_add(&self, product_id: Uuid, quantity: Quantity) -> Quantity {
        self.quantity_of(product_id).map_or(quantity, |q| q.add(quantity))
    }

    /// Adds to the existing line for the product, or appends a new line.
    pub fn add_item(&mut self, product_id: Uuid, quantity: Quantity, size: Option<Size>, now: DateTime<Utc>) -> &CartItem {
        let index = match self.items.iter().position(|i| i.product_id == product_id) {
            Some(index) => {
                let existing = &mut self.items[index];
                existing.quantity = existing.quantity.add(quantity);
                if size.is_some() { existing.size = size; }
                index
            }
            None => {
                self.items.push(CartItem { id: Uuid::now_v7(), product_id, quantity, size });
                self.items.len() - 1
            }
        };
        self.touch(now);
        &self.items[index]
    }

    pub fn item(&self, item_id: Uuid) -> Result<&CartItem, CartError> {
        self.items.iter().find(|i| i.id == item_id).ok_or(CartError::ItemNotFound)
    }

    pub fn update_quantity(&mut self, item_id: Uuid, quantity: Quantity, now: DateTime<Utc>) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.id == item_id).ok_or(CartError::ItemNotFound)?;
        item.quantity = quantity;
        self.touch(now);
        Ok(())
    }

    pub fn update_size(&mut self, item_id: Uuid, size: Option<Size>, now: DateTime<Utc>) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.id == item_id).ok_or(CartError::ItemNotFound)?;
        item.size = size;
        self.touch(now);
        Ok(())
    }

    /// Drops the line if present. Returns whether anything was removed.
    pub fn remove_item(&mut self, item_id: Uuid, now: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        let removed = self.items.len() != before;
        if removed { self.touch(now); }
        removed
    }

    /// Applies guest lines one by one, so duplicates inside `guest` accumulate.
    pub fn merge(&mut self, guest: &[GuestItem], now: DateTime<Utc>) {
        for item in guest {
            self.add_item(item.product_id, item.quantity, item.size, now);
        }
    }

    pub fn clear(&mut self, now: DateTime<Utc>) { self.items.clear(); self.touch(now); }

    fn touch(&mut self, now: DateTime<Utc>) { self.updated_at = now; }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { CartNotFound, ItemNotFound, Empty }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CartNotFound => write!(f, "Cart not found"),
            Self::ItemNotFound => write!(f, "Item not found in cart"),
            Self::Empty => write!(f, "Your cart is empty"),
        }
    }
}
