use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use rocket::futures::TryStreamExt;

use crate::db::{self, batch, DbConn};
use crate::guards::AuthGuard;
use crate::models::{CreateReviewDto, Order, OrderStatus, Review, Worker};
use crate::utils::{validate_rating, ApiResponse, ApiError};

#[openapi(tag = "Review")]
#[post("/reviews", data = "<dto>")]
pub async fn create_review(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateReviewDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_rating(dto.rating) {
        return Err(ApiError::bad_request("Rating must be between 1 and 5"));
    }

    let order_id = ObjectId::parse_str(&dto.order_id)
        .map_err(|_| ApiError::bad_request("Invalid order ID"))?;

    let order = db
        .collection::<Order>("orders")
        .find_one(doc! { "_id": order_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if order.customer_id != auth.user_id {
        return Err(ApiError::forbidden("You can only review your own orders"));
    }

    if order.status != OrderStatus::Completed {
        return Err(ApiError::conflict("Only completed orders can be reviewed"));
    }

    let existing = db
        .collection::<Review>("reviews")
        .find_one(doc! { "order_id": order_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::conflict("This order has already been reviewed"));
    }

    let comment = dto
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let review = Review {
        id: None,
        order_id,
        customer_id: auth.user_id,
        worker_id: order.worker_id,
        rating: dto.rating,
        comment,
        created_at: DateTime::now(),
    };

    // The unique order_id index closes the race between the check above
    // and this insert.
    let result = match db.collection::<Review>("reviews").insert_one(&review, None).await {
        Ok(r) => r,
        Err(e) if db::is_duplicate_key_error(&e) => {
            return Err(ApiError::conflict("This order has already been reviewed"));
        }
        Err(e) => return Err(ApiError::internal_error(format!("Failed to create review: {}", e))),
    };

    // Refresh the worker's denormalized aggregates; the review itself is
    // already durable, so a failure here only delays the averages.
    let all_reviews: Vec<Review> = db
        .collection::<Review>("reviews")
        .find(doc! { "worker_id": order.worker_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .try_collect()
        .await
        .map_err(|e| ApiError::internal_error(format!("Collection error: {}", e)))?;

    let total_reviews = all_reviews.len() as i32;
    let average_rating =
        all_reviews.iter().map(|r| r.rating).sum::<i32>() as f64 / total_reviews as f64;

    db.collection::<Worker>("workers")
        .update_one(
            doc! { "_id": order.worker_id },
            doc! {
                "$set": {
                    "average_rating": average_rating,
                    "total_reviews": total_reviews,
                    "updated_at": DateTime::now()
                }
            },
            None,
        )
        .await
        .ok();

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully".to_string(),
        serde_json::json!({
            "review_id": result.inserted_id.as_object_id().unwrap().to_hex()
        }),
    )))
}

#[openapi(tag = "Review")]
#[get("/reviews/worker/<worker_id>")]
pub async fn get_worker_reviews(
    db: &State<DbConn>,
    worker_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&worker_id)
        .map_err(|_| ApiError::bad_request("Invalid worker ID"))?;

    let find_options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();

    let mut cursor = db
        .collection::<Review>("reviews")
        .find(doc! { "worker_id": object_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut reviews = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let review = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        reviews.push(review);
    }

    let reviewer_ids: Vec<ObjectId> = reviews.iter().map(|r: &Review| r.customer_id).collect();
    let profiles = batch::profiles_by_user_ids(db, &reviewer_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let items: Vec<serde_json::Value> = reviews
        .into_iter()
        .map(|review| {
            serde_json::json!({
                "id": review.id.map(|id| id.to_hex()),
                "rating": review.rating,
                "comment": review.comment,
                "created_at": review.created_at.try_to_rfc3339_string().ok(),
                "customer_name": profiles.get(&review.customer_id).map(|p| p.full_name.clone()),
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "reviews": items,
        "total": items.len()
    }))))
}
