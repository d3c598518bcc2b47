use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::models::OrderStatus;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique per order (index created at startup); at most one review may
    /// ever reference an order.
    pub order_id: ObjectId,
    pub customer_id: ObjectId,
    pub worker_id: ObjectId,
    pub rating: i32, // 1-5
    pub comment: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReviewDto {
    pub order_id: String,
    pub rating: i32,
    pub comment: Option<String>,
}

/// A review may be written only once the order is completed, and only as
/// long as no review references it yet. The insert path re-checks this
/// against the unique order index; this gate is what list endpoints use to
/// tell the client whether to offer the action.
pub fn can_review(status: OrderStatus, already_reviewed: bool) -> bool {
    status == OrderStatus::Completed && !already_reviewed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_orders_are_reviewable() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::InProgress,
            OrderStatus::Cancelled,
        ] {
            assert!(!can_review(status, false));
        }
        assert!(can_review(OrderStatus::Completed, false));
    }

    #[test]
    fn a_reviewed_order_cannot_be_reviewed_again() {
        assert!(!can_review(OrderStatus::Completed, true));
    }

    #[test]
    fn cancelled_orders_never_become_reviewable() {
        assert!(!can_review(OrderStatus::Cancelled, false));
        assert!(!can_review(OrderStatus::Cancelled, true));
    }
}
