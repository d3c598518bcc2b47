use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::models::ServiceCategory;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Worker {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub bio: Option<String>,
    pub hourly_rate: f64,
    pub is_available: bool,
    /// Denormalized review aggregates, written by the review-insert path
    /// and never read back as an authority for eligibility decisions.
    pub average_rating: f64,
    pub total_reviews: i32,
    pub categories: Vec<ServiceCategory>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Worker {
    /// Fresh worker document for a newly registered worker account.
    pub fn new(user_id: ObjectId) -> Self {
        let now = DateTime::now();
        Worker {
            id: None,
            user_id,
            bio: None,
            hourly_rate: 0.0,
            is_available: true,
            average_rating: 0.0,
            total_reviews: 0,
            categories: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateWorkerDto {
    pub bio: Option<String>,
    pub hourly_rate: Option<f64>,
    pub categories: Option<Vec<ServiceCategory>>,
    pub is_available: Option<bool>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct SearchWorkersQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    /// `rating` (default), `price_asc` or `price_desc`.
    pub sort: Option<String>,
}
