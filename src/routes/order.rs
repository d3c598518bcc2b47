use mongodb::bson::oid::ObjectId;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOptions;

use crate::db::{batch, DbConn};
use crate::guards::{AuthGuard, WorkerGuard};
use crate::models::{
    can_review, CreateOrderDto, Order, OrderAction, OrderStatus, Service, Worker,
};
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Order")]
#[post("/orders", data = "<dto>")]
pub async fn create_order(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateOrderDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let description = dto.description.trim();
    if description.is_empty() {
        return Err(ApiError::bad_request("Description is required"));
    }

    let worker_id = ObjectId::parse_str(&dto.worker_id)
        .map_err(|_| ApiError::bad_request("Invalid worker ID"))?;

    db.collection::<Worker>("workers")
        .find_one(doc! { "_id": worker_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    let service_id = match dto.service_id.as_deref() {
        Some(raw) if !raw.is_empty() => {
            let service_id = ObjectId::parse_str(raw)
                .map_err(|_| ApiError::bad_request("Invalid service ID"))?;

            let service = db
                .collection::<Service>("services")
                .find_one(doc! { "_id": service_id }, None)
                .await
                .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
                .ok_or_else(|| ApiError::bad_request("Service not found"))?;

            if service.worker_id != worker_id {
                return Err(ApiError::bad_request("Service does not belong to this worker"));
            }

            Some(service_id)
        }
        _ => None,
    };

    let proposed_date = match dto.proposed_date.as_deref() {
        Some(raw) if !raw.is_empty() => {
            let parsed = chrono::DateTime::parse_from_rfc3339(raw)
                .map_err(|_| ApiError::bad_request("Invalid proposed date"))?;
            Some(DateTime::from_millis(parsed.timestamp_millis()))
        }
        _ => None,
    };

    let order = Order::new(
        auth.user_id,
        worker_id,
        service_id,
        description.to_string(),
        proposed_date,
    );

    let result = db
        .collection::<Order>("orders")
        .insert_one(&order, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create order: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Order submitted successfully".to_string(),
        serde_json::json!({
            "order_id": result.inserted_id.as_object_id().unwrap().to_hex(),
            "status": OrderStatus::Pending
        }),
    )))
}

#[openapi(tag = "Order")]
#[get("/orders/my")]
pub async fn list_my_orders(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();

    let mut cursor = db
        .collection::<Order>("orders")
        .find(doc! { "customer_id": auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut orders = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let order = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        orders.push(order);
    }

    let worker_ids: Vec<ObjectId> = orders.iter().map(|o: &Order| o.worker_id).collect();
    let service_ids: Vec<ObjectId> = orders.iter().filter_map(|o| o.service_id).collect();
    let order_ids: Vec<ObjectId> = orders.iter().filter_map(|o| o.id).collect();

    let workers = batch::workers_by_ids(db, &worker_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    let user_ids: Vec<ObjectId> = workers.values().map(|w| w.user_id).collect();
    let profiles = batch::profiles_by_user_ids(db, &user_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    let services = batch::services_by_ids(db, &service_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    let reviewed = batch::reviewed_order_ids(db, &order_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let items: Vec<serde_json::Value> = orders
        .into_iter()
        .filter_map(|order| {
            let id = order.id?;
            let worker_name = workers
                .get(&order.worker_id)
                .and_then(|w| profiles.get(&w.user_id))
                .map(|p| p.full_name.clone());
            let service_name = order
                .service_id
                .and_then(|sid| services.get(&sid))
                .map(|s| s.name.clone());
            let has_review = reviewed.contains(&id);

            Some(serde_json::json!({
                "id": id.to_hex(),
                "description": order.description,
                "status": order.status,
                "proposed_date": order.proposed_date.and_then(|d| d.try_to_rfc3339_string().ok()),
                "final_price": order.final_price,
                "created_at": order.created_at.try_to_rfc3339_string().ok(),
                "worker_id": order.worker_id.to_hex(),
                "worker_name": worker_name,
                "service_name": service_name,
                "has_review": has_review,
                "can_review": can_review(order.status, has_review),
            }))
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "orders": items,
        "total": items.len()
    }))))
}

#[openapi(tag = "Order")]
#[get("/orders/assigned")]
pub async fn list_assigned_orders(
    db: &State<DbConn>,
    guard: WorkerGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let worker_id = guard
        .worker
        .id
        .ok_or_else(|| ApiError::internal_error("Invalid worker ID"))?;

    let find_options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();

    let mut cursor = db
        .collection::<Order>("orders")
        .find(doc! { "worker_id": worker_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut orders = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let order = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        orders.push(order);
    }

    let customer_ids: Vec<ObjectId> = orders.iter().map(|o: &Order| o.customer_id).collect();
    let service_ids: Vec<ObjectId> = orders.iter().filter_map(|o| o.service_id).collect();

    let profiles = batch::profiles_by_user_ids(db, &customer_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    let services = batch::services_by_ids(db, &service_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let pending = orders.iter().filter(|o| o.status == OrderStatus::Pending).count();
    let active = orders
        .iter()
        .filter(|o| matches!(o.status, OrderStatus::Accepted | OrderStatus::InProgress))
        .count();
    let completed = orders.iter().filter(|o| o.status == OrderStatus::Completed).count();

    let items: Vec<serde_json::Value> = orders
        .into_iter()
        .filter_map(|order| {
            let id = order.id?;
            Some(serde_json::json!({
                "id": id.to_hex(),
                "description": order.description,
                "status": order.status,
                "proposed_date": order.proposed_date.and_then(|d| d.try_to_rfc3339_string().ok()),
                "final_price": order.final_price,
                "created_at": order.created_at.try_to_rfc3339_string().ok(),
                "customer_name": profiles.get(&order.customer_id).map(|p| p.full_name.clone()),
                "service_name": order
                    .service_id
                    .and_then(|sid| services.get(&sid))
                    .map(|s| s.name.clone()),
            }))
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "orders": items,
        "stats": {
            "pending": pending,
            "active": active,
            "completed": completed
        }
    }))))
}

/// Shared by the three transition endpoints: load, check ownership, apply
/// the lifecycle rule, write the new status. The order is left untouched
/// when the rule rejects the action.
async fn transition_order(
    db: &DbConn,
    worker: &Worker,
    order_id: &str,
    action: OrderAction,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(order_id)
        .map_err(|_| ApiError::bad_request("Invalid order ID"))?;

    let order = db
        .collection::<Order>("orders")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let worker_id = worker
        .id
        .ok_or_else(|| ApiError::internal_error("Invalid worker ID"))?;

    if order.worker_id != worker_id {
        return Err(ApiError::forbidden("Order does not belong to you"));
    }

    let next = action.apply(order.status).ok_or_else(|| {
        ApiError::conflict(match action {
            OrderAction::Accept => "Only pending orders can be accepted",
            OrderAction::Reject => "Only pending orders can be rejected",
            OrderAction::Complete => "Only accepted orders can be completed",
        })
    })?;

    let result = db
        .collection::<Order>("orders")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "status": next.as_str(), "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update order: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Order not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "order_id": order_id,
        "status": next
    }))))
}

#[openapi(tag = "Order")]
#[post("/orders/<order_id>/accept")]
pub async fn accept_order(
    db: &State<DbConn>,
    guard: WorkerGuard,
    order_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    transition_order(db, &guard.worker, &order_id, OrderAction::Accept).await
}

#[openapi(tag = "Order")]
#[post("/orders/<order_id>/reject")]
pub async fn reject_order(
    db: &State<DbConn>,
    guard: WorkerGuard,
    order_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    transition_order(db, &guard.worker, &order_id, OrderAction::Reject).await
}

#[openapi(tag = "Order")]
#[post("/orders/<order_id>/complete")]
pub async fn complete_order(
    db: &State<DbConn>,
    guard: WorkerGuard,
    order_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    transition_order(db, &guard.worker, &order_id, OrderAction::Complete).await
}
