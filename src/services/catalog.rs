//! Product catalog and reviews
//!
//! Review writes are followed by an explicit rating recomputation. The
//! recomputation reads all ratings and then writes the summary without a
//! lock, so two concurrent review writes on one product can leave a summary
//! computed from a stale read; the next review write corrects it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::aggregates::{NewProduct, NewReview, Product, ProductPatch, RatingSummary, Review, ReviewPatch, User};
use crate::domain::value_objects::Slug;
use crate::store::{ProductListParams, ProductQuery, ReviewFilter, Store};
use crate::{EcommerceError, Result};

/// A product with its reviews, as served by the detail route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
}

fn product_not_found() -> EcommerceError {
    EcommerceError::not_found("No product found with that ID")
}

fn review_not_found() -> EcommerceError {
    EcommerceError::not_found("No review found with that ID")
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self, params: ProductListParams) -> Result<Vec<Product>> {
        let query = ProductQuery::from_params(params).map_err(EcommerceError::bad_request)?;
        self.store.list_products(&query).await
    }

    /// Resolves an identifier that is either a product id or a slug.
    pub async fn find_product(&self, id_or_slug: &str) -> Result<Product> {
        let found = match Uuid::parse_str(id_or_slug) {
            Ok(id) => self.store.find_product(id).await?,
            Err(_) => self.store.find_product_by_slug(&Slug::from_stored(id_or_slug)).await?,
        };
        found.ok_or_else(product_not_found)
    }

    pub async fn product_detail(&self, id_or_slug: &str) -> Result<ProductDetail> {
        let product = self.find_product(id_or_slug).await?;
        let reviews = self.store.list_reviews(ReviewFilter { product_id: Some(product.id), user_id: None }).await?;
        Ok(ProductDetail { product, reviews })
    }

    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let product = Product::create(new, Utc::now())?;
        self.store.insert_product(&product).await?;
        info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    pub async fn update_product(&self, id_or_slug: &str, patch: ProductPatch) -> Result<Product> {
        let mut product = self.find_product(id_or_slug).await?;
        product.apply_patch(patch, Utc::now())?;
        self.store.save_product(&product).await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id_or_slug: &str) -> Result<()> {
        let product = self.find_product(id_or_slug).await?;
        if !self.store.delete_product(product.id).await? {
            return Err(product_not_found());
        }
        info!(product_id = %product.id, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    pub async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<Review>> {
        self.store.list_reviews(filter).await
    }

    pub async fn get_review(&self, id: Uuid) -> Result<Review> {
        self.store.find_review(id).await?.ok_or_else(review_not_found)
    }

    pub async fn create_review(&self, user: &User, product_id: Uuid, new: NewReview) -> Result<Review> {
        self.store.find_product(product_id).await?.ok_or_else(product_not_found)?;
        let review = Review::write(product_id, user.id, new, Utc::now())?;
        self.store.insert_review(&review).await?;
        self.recompute_ratings(product_id).await?;
        Ok(review)
    }

    /// Author or admin only.
    pub async fn update_review(&self, user: &User, id: Uuid, patch: ReviewPatch) -> Result<Review> {
        let mut review = self.get_review(id).await?;
        ensure_author_or_admin(user, &review)?;
        review.apply_patch(patch, Utc::now())?;
        self.store.save_review(&review).await?;
        self.recompute_ratings(review.product_id).await?;
        Ok(review)
    }

    /// Author or admin only.
    pub async fn delete_review(&self, user: &User, id: Uuid) -> Result<()> {
        let review = self.get_review(id).await?;
        ensure_author_or_admin(user, &review)?;
        if !self.store.delete_review(id).await? {
            return Err(review_not_found());
        }
        self.recompute_ratings(review.product_id).await?;
        Ok(())
    }

    pub async fn recompute_ratings(&self, product_id: Uuid) -> Result<RatingSummary> {
        let ratings = self.store.product_ratings(product_id).await?;
        let summary = RatingSummary::from_ratings(&ratings);
        self.store.set_product_ratings(product_id, summary).await?;
        debug!(product_id = %product_id, average = summary.average, quantity = summary.quantity, "Ratings recomputed");
        Ok(summary)
    }
}

fn ensure_author_or_admin(user: &User, review: &Review) -> Result<()> {
    if review.is_written_by(user.id) || user.is_admin() {
        Ok(())
    } else {
        Err(EcommerceError::forbidden("You can only change your own reviews"))
    }
}
