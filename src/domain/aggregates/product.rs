//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Quantity, Rating, Slug};

pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;
/// Prices are whole cents.
pub const PRICE_SCALE: u32 = 2;
/// Stock is stored as a 32-bit signed integer.
pub const MAX_STOCK: u32 = i32::MAX as u32;

/// Largest amount a `NUMERIC(12, 2)` column holds.
fn max_price() -> Decimal { Decimal::new(999_999_999_999, PRICE_SCALE) }

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Decimal,
    pub price_discount: Decimal,
    pub category: String,
    pub stock_no: u32,
    pub image_url: String,
    pub ratings_average: f64,
    pub ratings_quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub price_discount: Decimal,
    pub category: String,
    #[serde(default)]
    pub stock_no: u32,
    pub image_url: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub price_discount: Option<Decimal>,
    pub category: Option<String>,
    pub stock_no: Option<u32>,
    pub image_url: Option<String>,
}

/// Average and count of a product's review ratings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingSummary { pub average: f64, pub quantity: u32 }

impl RatingSummary {
    /// Mean rounded to one decimal; no ratings falls back to the catalog default.
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        if ratings.is_empty() {
            return Self { average: DEFAULT_RATINGS_AVERAGE, quantity: 0 };
        }
        let sum: u32 = ratings.iter().map(|r| u32::from(r.value())).sum();
        let mean = f64::from(sum) / ratings.len() as f64;
        Self { average: (mean * 10.0).round() / 10.0, quantity: ratings.len() as u32 }
    }
}

impl Product {
    pub fn create(new: NewProduct, now: DateTime<Utc>) -> Result<Self, ProductError> {
        let product = Self {
            id: Uuid::now_v7(), slug: Slug::from_name(&new.name), name: new.name, description: new.description,
            price: new.price, price_discount: new.price_discount, category: new.category, stock_no: new.stock_no,
            image_url: new.image_url, ratings_average: DEFAULT_RATINGS_AVERAGE, ratings_quantity: 0,
            created_at: now, updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> Result<(), ProductError> {
        let mut next = self.clone();
        if let Some(name) = patch.name { next.slug = Slug::from_name(&name); next.name = name; }
        if let Some(v) = patch.description { next.description = v; }
        if let Some(v) = patch.price { next.price = v; }
        if let Some(v) = patch.price_discount { next.price_discount = v; }
        if let Some(v) = patch.category { next.category = v; }
        if let Some(v) = patch.stock_no { next.stock_no = v; }
        if let Some(v) = patch.image_url { next.image_url = v; }
        next.validate()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Price charged at checkout: the discount price when one is set.
    pub fn unit_price(&self) -> Decimal {
        if self.price_discount > Decimal::ZERO { self.price_discount } else { self.price }
    }

    pub fn is_in_stock(&self) -> bool { self.stock_no > 0 }

    /// Fails when `quantity` units cannot be supplied from current stock.
    pub fn ensure_available(&self, quantity: Quantity) -> Result<(), ProductError> {
        if quantity.value() > self.stock_no {
            return Err(ProductError::InsufficientInventory { name: self.name.clone(), available: self.stock_no });
        }
        Ok(())
    }

    pub fn apply_ratings(&mut self, summary: RatingSummary) {
        self.ratings_average = summary.average;
        self.ratings_quantity = summary.quantity;
    }

    fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if self.slug.as_str().is_empty() { return Err(ProductError::InvalidName); }
        if self.price < Decimal::ZERO { return Err(ProductError::NegativePrice); }
        for amount in [self.price, self.price_discount] {
            if amount.normalize().scale() > PRICE_SCALE { return Err(ProductError::FractionalCents { amount }); }
            if amount > max_price() { return Err(ProductError::PriceTooLarge { amount }); }
        }
        if self.stock_no > MAX_STOCK { return Err(ProductError::StockTooLarge); }
        if self.price_discount < Decimal::ZERO || (self.price_discount > Decimal::ZERO && self.price_discount >= self.price) {
            return Err(ProductError::DiscountNotBelowPrice { discount: self.price_discount });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductError {
    MissingName,
    InvalidName,
    NegativePrice,
    FractionalCents { amount: Decimal },
    PriceTooLarge { amount: Decimal },
    StockTooLarge,
    DiscountNotBelowPrice { discount: Decimal },
    InsufficientInventory { name: String, available: u32 },
}
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "A product must have a name"),
            Self::InvalidName => write!(f, "A product name must contain letters or digits"),
            Self::NegativePrice => write!(f, "Price cannot be negative"),
            Self::FractionalCents { amount } => write!(f, "Prices can have at most {PRICE_SCALE} decimal places, got {amount}"),
            Self::PriceTooLarge { amount } => write!(f, "Price {amount} is too large"),
            Self::StockTooLarge => write!(f, "Stock cannot exceed {MAX_STOCK}"),
            Self::DiscountNotBelowPrice { discount } => write!(f, "Discount Price ({discount}) should be below the regular price"),
            Self::InsufficientInventory { name, available } => write!(f, "Only {available} of {name} left in stock"),
        }
    }
}
