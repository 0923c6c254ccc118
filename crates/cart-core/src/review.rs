//! # Review Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reviewer as embedded in a review: either a bare id or a populated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reviewer {
    Id(String),
    Profile {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default)]
        name: String,
    },
}

impl Reviewer {
    pub fn id(&self) -> &str {
        match self {
            Reviewer::Id(id) => id,
            Reviewer::Profile { id, .. } => id,
        }
    }
}

/// A product review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(deserialize_with = "object_id")]
    pub product: String,
    pub user: Reviewer,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default, alias = "helpful")]
    pub helpful_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accept either `"id"` or `{"_id": "id", ...}`
fn object_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdOrObject {
        Id(String),
        Object {
            #[serde(rename = "_id", alias = "id")]
            id: String,
        },
    }

    Ok(match IdOrObject::deserialize(deserializer)? {
        IdOrObject::Id(id) => id,
        IdOrObject::Object { id } => id,
    })
}

/// Body of `POST /api/reviews`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    #[serde(rename = "product")]
    pub product_id: String,
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    /// Client-side form check; `Err` carries the message to show inline
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        if self.comment.trim().is_empty() {
            return Err("Please write a comment".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_review_populated_and_bare_refs() {
        let review: Review = serde_json::from_value(json!({
            "_id": "r1",
            "product": {"_id": "p1", "name": "Ghee"},
            "user": {"_id": "u1", "name": "Ravi"},
            "rating": 4,
            "comment": "Fresh",
            "isApproved": true
        }))
        .unwrap();
        assert_eq!(review.product, "p1");
        assert_eq!(review.user.id(), "u1");

        let review: Review = serde_json::from_value(json!({
            "_id": "r2", "product": "p2", "user": "u2", "rating": 5, "helpful": 3
        }))
        .unwrap();
        assert_eq!(review.product, "p2");
        assert_eq!(review.user, Reviewer::Id("u2".into()));
        assert_eq!(review.helpful_count, 3);
    }

    #[test]
    fn test_new_review_validation() {
        let mut review = NewReview {
            product_id: "p1".into(),
            rating: 6,
            comment: "ok".into(),
        };
        assert!(review.validate().is_err());

        review.rating = 5;
        assert!(review.validate().is_ok());

        review.comment = "  ".into();
        assert!(review.validate().is_err());
    }
}
