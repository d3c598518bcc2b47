use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

/// Lifecycle of a booking request.
///
/// `InProgress` exists in the persisted vocabulary but no action moves an
/// order into it; it is kept so existing documents keep deserializing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transition; only a review may
    /// follow a completed order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// The three worker-triggered transitions. Customers cannot move an order
/// at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Accept,
    Reject,
    Complete,
}

impl OrderAction {
    /// The only status this action may be applied from.
    pub fn source(&self) -> OrderStatus {
        match self {
            OrderAction::Accept | OrderAction::Reject => OrderStatus::Pending,
            OrderAction::Complete => OrderStatus::Accepted,
        }
    }

    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Accept => OrderStatus::Accepted,
            OrderAction::Reject => OrderStatus::Cancelled,
            OrderAction::Complete => OrderStatus::Completed,
        }
    }

    /// Resulting status, or `None` when the order is not in this action's
    /// source state. The caller leaves the order untouched in that case.
    pub fn apply(&self, current: OrderStatus) -> Option<OrderStatus> {
        if current == self.source() {
            Some(self.target())
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub customer_id: ObjectId,
    pub worker_id: ObjectId,
    pub service_id: Option<ObjectId>,
    pub description: String,
    pub proposed_date: Option<DateTime>,
    pub final_price: Option<f64>,
    pub status: OrderStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Order {
    /// Every order starts out pending; there is no way to create one in
    /// any other state.
    pub fn new(
        customer_id: ObjectId,
        worker_id: ObjectId,
        service_id: Option<ObjectId>,
        description: String,
        proposed_date: Option<DateTime>,
    ) -> Self {
        let now = DateTime::now();
        Order {
            id: None,
            customer_id,
            worker_id,
            service_id,
            description,
            proposed_date,
            final_price: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateOrderDto {
    pub worker_id: String,
    pub service_id: Option<String>,
    pub description: String,
    /// RFC 3339 timestamp, e.g. `2026-08-15T09:00:00+02:00`.
    pub proposed_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some_order() -> Order {
        Order::new(
            ObjectId::new(),
            ObjectId::new(),
            None,
            "Posekat trávník za domem".to_string(),
            None,
        )
    }

    #[test]
    fn new_orders_are_always_pending() {
        assert_eq!(some_order().status, OrderStatus::Pending);
    }

    #[test]
    fn accept_and_reject_only_from_pending() {
        for action in [OrderAction::Accept, OrderAction::Reject] {
            assert_eq!(action.apply(OrderStatus::Pending), Some(action.target()));
            for status in [
                OrderStatus::Accepted,
                OrderStatus::InProgress,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ] {
                assert_eq!(action.apply(status), None);
            }
        }
    }

    #[test]
    fn complete_only_from_accepted() {
        assert_eq!(
            OrderAction::Complete.apply(OrderStatus::Accepted),
            Some(OrderStatus::Completed)
        );
        for status in [
            OrderStatus::Pending,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderAction::Complete.apply(status), None);
        }
    }

    #[test]
    fn accept_on_completed_leaves_status_unchanged() {
        let mut order = some_order();
        order.status = OrderStatus::Completed;
        if let Some(next) = OrderAction::Accept.apply(order.status) {
            order.status = next;
        }
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
    }

    #[test]
    fn no_action_reaches_in_progress() {
        for action in [OrderAction::Accept, OrderAction::Reject, OrderAction::Complete] {
            assert_ne!(action.target(), OrderStatus::InProgress);
        }
    }

    #[test]
    fn full_lifecycle_pending_to_completed() {
        let mut order = some_order();
        order.status = OrderAction::Accept.apply(order.status).unwrap();
        assert_eq!(order.status, OrderStatus::Accepted);
        order.status = OrderAction::Complete.apply(order.status).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.status.is_terminal());
    }

    #[test]
    fn rejected_order_stays_cancelled() {
        let mut order = some_order();
        order.status = OrderAction::Reject.apply(order.status).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        for action in [OrderAction::Accept, OrderAction::Reject, OrderAction::Complete] {
            assert_eq!(action.apply(order.status), None);
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(OrderStatus::InProgress.as_str(), "in_progress");
    }
}
