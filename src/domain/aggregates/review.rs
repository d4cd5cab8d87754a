//! Review Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::Rating;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub review: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewReview {
    pub review: String,
    pub rating: Rating,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReviewPatch {
    pub review: Option<String>,
    pub rating: Option<Rating>,
}

impl Review {
    pub fn write(product_id: Uuid, user_id: Uuid, new: NewReview, now: DateTime<Utc>) -> Result<Self, ReviewError> {
        let review = new.review.trim().to_string();
        if review.is_empty() { return Err(ReviewError::Empty); }
        Ok(Self { id: Uuid::now_v7(), product_id, user_id, review, rating: new.rating, created_at: now, updated_at: now })
    }

    pub fn apply_patch(&mut self, patch: ReviewPatch, now: DateTime<Utc>) -> Result<(), ReviewError> {
        if let Some(text) = patch.review {
            let text = text.trim().to_string();
            if text.is_empty() { return Err(ReviewError::Empty); }
            self.review = text;
        }
        if let Some(rating) = patch.rating { self.rating = rating; }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_written_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ReviewError { Empty }
impl std::error::Error for ReviewError {}
impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Review can not be empty") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_review_rejected() {
        let new = NewReview { review: "   ".into(), rating: Rating::new(4).unwrap() };
        assert_eq!(Review::write(Uuid::new_v4(), Uuid::new_v4(), new, Utc::now()).unwrap_err(), ReviewError::Empty);
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let new = NewReview { review: "Great fit".into(), rating: Rating::new(4).unwrap() };
        let mut r = Review::write(Uuid::new_v4(), Uuid::new_v4(), new, Utc::now()).unwrap();
        r.apply_patch(ReviewPatch { rating: Some(Rating::new(2).unwrap()), review: None }, Utc::now()).unwrap();
        assert_eq!(r.review, "Great fit");
        assert_eq!(r.rating.value(), 2);
    }
}
