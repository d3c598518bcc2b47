use mongodb::bson::oid::ObjectId;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, Bson, DateTime};
use mongodb::options::FindOptions;
use serde::Serialize;

use crate::db::{batch, DbConn};
use crate::guards::WorkerGuard;
use crate::models::{
    Profile, Review, SearchWorkersQuery, Service, ServiceCategory, UpdateWorkerDto, Worker,
};
use crate::utils::{ApiResponse, ApiError};

#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: ServiceCategory,
}

impl From<Service> for ServiceSummary {
    fn from(service: Service) -> Self {
        ServiceSummary {
            id: service.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: service.name,
            description: service.description,
            price: service.price,
            category: service.category,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkerSearchItem {
    pub id: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: f64,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub categories: Vec<ServiceCategory>,
    pub services: Vec<ServiceSummary>,
}

/// Free-text match over everything a customer sees on a result card:
/// name, bio, category labels, and service names/descriptions.
fn matches_query(item: &WorkerSearchItem, q: &str) -> bool {
    let q = q.to_lowercase();
    let contains = |s: &str| s.to_lowercase().contains(q.as_str());

    contains(&item.full_name)
        || item.bio.as_deref().is_some_and(contains)
        || item.categories.iter().any(|c| contains(c.label()))
        || item
            .services
            .iter()
            .any(|s| contains(&s.name) || s.description.as_deref().is_some_and(contains))
}

#[openapi(tag = "Worker")]
#[get("/workers/search?<query..>")]
pub async fn search_workers(
    db: &State<DbConn>,
    query: SearchWorkersQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut filter = doc! {
        "is_available": true,
    };

    if let Some(ref category) = query.category {
        let category = ServiceCategory::parse(category)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown category: {}", category)))?;
        filter.insert("categories", category.as_str());
    }

    let sort = match query.sort.as_deref() {
        None | Some("rating") => doc! { "average_rating": -1 },
        Some("price_asc") => doc! { "hourly_rate": 1 },
        Some("price_desc") => doc! { "hourly_rate": -1 },
        Some(other) => {
            return Err(ApiError::bad_request(format!("Unknown sort: {}", other)));
        }
    };

    let find_options = FindOptions::builder().sort(sort).build();

    let mut cursor = db
        .collection::<Worker>("workers")
        .find(filter, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut workers = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let worker = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        workers.push(worker);
    }

    let user_ids: Vec<ObjectId> = workers.iter().map(|w| w.user_id).collect();
    let worker_ids: Vec<ObjectId> = workers.iter().filter_map(|w| w.id).collect();

    let profiles = batch::profiles_by_user_ids(db, &user_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    let mut services = batch::services_by_worker_ids(db, &worker_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut items: Vec<WorkerSearchItem> = workers
        .into_iter()
        .filter_map(|worker| {
            let id = worker.id?;
            let profile = profiles.get(&worker.user_id);
            Some(WorkerSearchItem {
                id: id.to_hex(),
                full_name: profile.map(|p| p.full_name.clone()).unwrap_or_default(),
                avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                bio: worker.bio,
                hourly_rate: worker.hourly_rate,
                average_rating: worker.average_rating,
                total_reviews: worker.total_reviews,
                categories: worker.categories,
                services: services
                    .remove(&id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(ServiceSummary::from)
                    .collect(),
            })
        })
        .collect();

    if let Some(ref q) = query.q {
        let q = q.trim();
        if !q.is_empty() {
            items.retain(|item| matches_query(item, q));
        }
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "workers": items,
        "total": items.len()
    }))))
}

#[openapi(tag = "Worker")]
#[get("/workers/<worker_id>")]
pub async fn get_worker(
    db: &State<DbConn>,
    worker_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&worker_id)
        .map_err(|_| ApiError::bad_request("Invalid worker ID"))?;

    let worker = db
        .collection::<Worker>("workers")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    let profile = db
        .collection::<Profile>("profiles")
        .find_one(doc! { "user_id": worker.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut cursor = db
        .collection::<Service>("services")
        .find(doc! { "worker_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut services = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let service: Service = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        services.push(ServiceSummary::from(service));
    }

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
    let reviewer_profiles = batch::profiles_by_user_ids(db, &reviewer_ids)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let reviews: Vec<serde_json::Value> = reviews
        .into_iter()
        .map(|review| {
            serde_json::json!({
                "id": review.id.map(|id| id.to_hex()),
                "rating": review.rating,
                "comment": review.comment,
                "created_at": review.created_at.try_to_rfc3339_string().ok(),
                "customer_name": reviewer_profiles
                    .get(&review.customer_id)
                    .map(|p| p.full_name.clone()),
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "worker": {
            "id": worker_id,
            "full_name": profile.as_ref().map(|p| p.full_name.clone()),
            "avatar_url": profile.as_ref().and_then(|p| p.avatar_url.clone()),
            "phone": profile.as_ref().and_then(|p| p.phone.clone()),
            "bio": worker.bio,
            "hourly_rate": worker.hourly_rate,
            "is_available": worker.is_available,
            "average_rating": worker.average_rating,
            "total_reviews": worker.total_reviews,
            "categories": worker.categories,
        },
        "services": services,
        "reviews": reviews
    }))))
}

#[openapi(tag = "Worker")]
#[get("/workers/me")]
pub async fn get_my_worker_profile(
    guard: WorkerGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    Ok(Json(ApiResponse::success(serde_json::json!(guard.worker))))
}

#[openapi(tag = "Worker")]
#[put("/workers/me", data = "<dto>")]
pub async fn update_my_worker_profile(
    db: &State<DbConn>,
    guard: WorkerGuard,
    dto: Json<UpdateWorkerDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref bio) = dto.bio {
        let bio = bio.trim();
        if bio.is_empty() {
            update_doc.insert("bio", Bson::Null);
        } else {
            update_doc.insert("bio", bio);
        }
    }
    if let Some(rate) = dto.hourly_rate {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ApiError::bad_request("Hourly rate must be non-negative"));
        }
        update_doc.insert("hourly_rate", rate);
    }
    if let Some(ref categories) = dto.categories {
        let categories: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
        update_doc.insert("categories", categories);
    }
    if let Some(available) = dto.is_available {
        update_doc.insert("is_available", available);
    }

    let result = db
        .collection::<Worker>("workers")
        .update_one(
            doc! { "user_id": guard.auth.user_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update profile: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Worker profile not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Worker profile updated successfully"
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(
        full_name: &str,
        bio: Option<&str>,
        categories: Vec<ServiceCategory>,
        services: Vec<(&str, Option<&str>)>,
    ) -> WorkerSearchItem {
        WorkerSearchItem {
            id: ObjectId::new().to_hex(),
            full_name: full_name.to_string(),
            avatar_url: None,
            bio: bio.map(|b| b.to_string()),
            hourly_rate: 350.0,
            average_rating: 4.5,
            total_reviews: 12,
            categories,
            services: services
                .into_iter()
                .map(|(name, description)| ServiceSummary {
                    id: ObjectId::new().to_hex(),
                    name: name.to_string(),
                    description: description.map(|d| d.to_string()),
                    price: 500.0,
                    category: ServiceCategory::Garden,
                })
                .collect(),
        }
    }

    #[test]
    fn query_matches_service_name() {
        let gardener = item(
            "Petr Svoboda",
            Some("Zahradník s deseti lety praxe"),
            vec![ServiceCategory::Garden],
            vec![("Sekání trávníku", Some("Včetně odvozu trávy"))],
        );
        assert!(matches_query(&gardener, "trávník"));
        assert!(matches_query(&gardener, "TRÁVNÍK"));
    }

    #[test]
    fn query_matches_name_bio_and_category_label() {
        let gardener = item(
            "Petr Svoboda",
            Some("Zahradník s deseti lety praxe"),
            vec![ServiceCategory::Garden],
            vec![],
        );
        assert!(matches_query(&gardener, "svoboda"));
        assert!(matches_query(&gardener, "praxe"));
        // "Zahrada & exteriér" label, not a document field
        assert!(matches_query(&gardener, "zahrada"));
    }

    #[test]
    fn query_misses_unrelated_worker() {
        let mover = item(
            "Karel Dvořák",
            None,
            vec![ServiceCategory::Moving],
            vec![("Stěhování bytů", None)],
        );
        assert!(!matches_query(&mover, "trávník"));
    }
}
