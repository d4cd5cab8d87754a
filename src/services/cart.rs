//! Cart manager
//!
//! Every change runs through [`CartStore::update_cart`](crate::store::CartStore::update_cart),
//! so get-or-create and the item upsert happen under one lock. Stock is
//! checked against the quantity a line would hold after the change.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CartError, GuestItem, Product, User};
use crate::domain::value_objects::{Quantity, Size, Slug};
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "Quantity::one")]
    pub quantity: Quantity,
    #[serde(default)]
    pub size: Option<Size>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSizeRequest {
    pub size: Option<Size>,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub items: Vec<GuestItem>,
}

/// Display fields of the product a cart line points at.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: Slug,
    pub price: Decimal,
    pub price_discount: Decimal,
    pub image_url: String,
    pub stock_no: u32,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            slug: p.slug.clone(),
            price: p.price,
            price_discount: p.price_discount,
            image_url: p.image_url.clone(),
            stock_no: p.stock_no,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub product: ProductSummary,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// A cart with its lines resolved against the catalog.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
    pub items: Vec<CartLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartView {
    pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> {
        self.items.iter().find(|l| l.product.id == product_id).map(|l| l.quantity)
    }
}

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
}

impl CartService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Missing cart reads as an empty one.
    pub async fn get_cart(&self, user: &User) -> Result<CartView> {
        match self.store.find_cart(user.id).await? {
            Some(cart) => self.view(&cart).await,
            None => Ok(CartView::default()),
        }
    }

    pub async fn add_item(&self, user: &User, req: AddItemRequest) -> Result<CartView> {
        let product = self.product(req.product_id).await?;
        let AddItemRequest { product_id, quantity, size } = req;

        let cart = self
            .store
            .update_cart(user.id, true, Box::new(move |cart: &mut Cart| -> Result<()> {
                product.ensure_available(cart.quantity_after_add(product_id, quantity))?;
                cart.add_item(product_id, quantity, size, Utc::now());
                Ok(())
            }))
            .await?;
        debug!(user_id = %user.id, product_id = %product_id, "Item added to cart");
        self.view(&cart).await
    }

    pub async fn update_item(&self, user: &User, item_id: Uuid, quantity: u32) -> Result<CartView> {
        let quantity = Quantity::new(quantity)?;
        let current = self.store.find_cart(user.id).await?.ok_or(CartError::CartNotFound)?;
        let product = self.product(current.item(item_id)?.product_id).await?;

        let cart = self
            .store
            .update_cart(user.id, false, Box::new(move |cart: &mut Cart| -> Result<()> {
                product.ensure_available(quantity)?;
                cart.update_quantity(item_id, quantity, Utc::now())?;
                Ok(())
            }))
            .await?;
        self.view(&cart).await
    }

    pub async fn update_size(&self, user: &User, item_id: Uuid, size: Option<Size>) -> Result<CartView> {
        let cart = self
            .store
            .update_cart(user.id, false, Box::new(move |cart: &mut Cart| -> Result<()> {
                cart.update_size(item_id, size, Utc::now())?;
                Ok(())
            }))
            .await?;
        self.view(&cart).await
    }

    /// Unknown item ids (or no cart at all) leave everything unchanged.
    pub async fn remove_item(&self, user: &User, item_id: Uuid) -> Result<CartView> {
        if self.store.find_cart(user.id).await?.is_none() {
            return Ok(CartView::default());
        }
        let cart = self
            .store
            .update_cart(user.id, false, Box::new(move |cart: &mut Cart| -> Result<()> {
                cart.remove_item(item_id, Utc::now());
                Ok(())
            }))
            .await?;
        self.view(&cart).await
    }

    pub async fn clear(&self, user: &User) -> Result<()> {
        self.store.delete_cart(user.id).await?;
        Ok(())
    }

    /// Folds a guest cart into the user's cart in one atomic update.
    pub async fn merge(&self, user: &User, guest: Vec<GuestItem>) -> Result<CartView> {
        let ids: Vec<Uuid> = guest.iter().map(|g| g.product_id).collect();
        let products: HashMap<Uuid, Product> =
            self.store.find_products(&ids).await?.into_iter().map(|p| (p.id, p)).collect();
        if let Some(missing) = ids.iter().find(|id| !products.contains_key(id)) {
            return Err(EcommerceError::not_found(format!("Product {missing} not found")));
        }

        let cart = self
            .store
            .update_cart(user.id, true, Box::new(move |cart: &mut Cart| -> Result<()> {
                let mut totals: HashMap<Uuid, Quantity> = HashMap::new();
                for item in &guest {
                    let current = totals.get(&item.product_id).copied().or_else(|| cart.quantity_of(item.product_id));
                    let total = current.map_or(item.quantity, |q| q.add(item.quantity));
                    totals.insert(item.product_id, total);
                }
                for (product_id, total) in &totals {
                    if let Some(product) = products.get(product_id) {
                        product.ensure_available(*total)?;
                    }
                }
                cart.merge(&guest, Utc::now());
                Ok(())
            }))
            .await?;
        debug!(user_id = %user.id, lines = cart.item_count(), "Guest cart merged");
        self.view(&cart).await
    }

    async fn product(&self, id: Uuid) -> Result<Product> {
        self.store.find_product(id).await?.ok_or_else(|| EcommerceError::not_found("Product not found"))
    }

    /// Lines whose product no longer exists are left out.
    async fn view(&self, cart: &Cart) -> Result<CartView> {
        let ids: Vec<Uuid> = cart.items().iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> =
            self.store.find_products(&ids).await?.into_iter().map(|p| (p.id, p)).collect();

        let items = cart
            .items()
            .iter()
            .filter_map(|item| {
                products.get(&item.product_id).map(|product| CartLine {
                    id: item.id,
                    product: ProductSummary::from(product),
                    quantity: item.quantity.value(),
                    size: item.size,
                })
            })
            .collect();

        Ok(CartView { id: Some(cart.id()), user: Some(cart.user_id()), items, updated_at: Some(cart.updated_at()) })
    }
}
