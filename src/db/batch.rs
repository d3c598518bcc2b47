//! Batch lookups for related documents.
//!
//! List endpoints collect the id sets they need and resolve them here with
//! one `$in` query per collection, instead of spelling the joins out in
//! every handler.

use std::collections::{HashMap, HashSet};

use mongodb::bson::{doc, oid::ObjectId};

use crate::db::DbConn;
use crate::models::{Profile, Review, Service, Worker};

/// Profiles keyed by their owning user id.
pub async fn profiles_by_user_ids(
    db: &DbConn,
    user_ids: &[ObjectId],
) -> Result<HashMap<ObjectId, Profile>, mongodb::error::Error> {
    let mut profiles = HashMap::new();
    if user_ids.is_empty() {
        return Ok(profiles);
    }

    let mut cursor = db
        .collection::<Profile>("profiles")
        .find(doc! { "user_id": { "$in": user_ids.to_vec() } }, None)
        .await?;

    while cursor.advance().await? {
        let profile = cursor.deserialize_current()?;
        profiles.insert(profile.user_id, profile);
    }

    Ok(profiles)
}

pub async fn workers_by_ids(
    db: &DbConn,
    worker_ids: &[ObjectId],
) -> Result<HashMap<ObjectId, Worker>, mongodb::error::Error> {
    let mut workers = HashMap::new();
    if worker_ids.is_empty() {
        return Ok(workers);
    }

    let mut cursor = db
        .collection::<Worker>("workers")
        .find(doc! { "_id": { "$in": worker_ids.to_vec() } }, None)
        .await?;

    while cursor.advance().await? {
        let worker = cursor.deserialize_current()?;
        if let Some(id) = worker.id {
            workers.insert(id, worker);
        }
    }

    Ok(workers)
}

pub async fn services_by_ids(
    db: &DbConn,
    service_ids: &[ObjectId],
) -> Result<HashMap<ObjectId, Service>, mongodb::error::Error> {
    let mut services = HashMap::new();
    if service_ids.is_empty() {
        return Ok(services);
    }

    let mut cursor = db
        .collection::<Service>("services")
        .find(doc! { "_id": { "$in": service_ids.to_vec() } }, None)
        .await?;

    while cursor.advance().await? {
        let service = cursor.deserialize_current()?;
        if let Some(id) = service.id {
            services.insert(id, service);
        }
    }

    Ok(services)
}

/// All services of the given workers, grouped per worker.
pub async fn services_by_worker_ids(
    db: &DbConn,
    worker_ids: &[ObjectId],
) -> Result<HashMap<ObjectId, Vec<Service>>, mongodb::error::Error> {
    let mut services: HashMap<ObjectId, Vec<Service>> = HashMap::new();
    if worker_ids.is_empty() {
        return Ok(services);
    }

    let mut cursor = db
        .collection::<Service>("services")
        .find(doc! { "worker_id": { "$in": worker_ids.to_vec() } }, None)
        .await?;

    while cursor.advance().await? {
        let service = cursor.deserialize_current()?;
        services.entry(service.worker_id).or_default().push(service);
    }

    Ok(services)
}

/// The subset of the given order ids that already carry a review.
pub async fn reviewed_order_ids(
    db: &DbConn,
    order_ids: &[ObjectId],
) -> Result<HashSet<ObjectId>, mongodb::error::Error> {
    let mut reviewed = HashSet::new();
    if order_ids.is_empty() {
        return Ok(reviewed);
    }

    let mut cursor = db
        .collection::<Review>("reviews")
        .find(doc! { "order_id": { "$in": order_ids.to_vec() } }, None)
        .await?;

    while cursor.advance().await? {
        let review = cursor.deserialize_current()?;
        reviewed.insert(review.order_id);
    }

    Ok(reviewed)
}
