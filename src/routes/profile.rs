use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime};

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{Profile, ProfileResponse, RoleBinding, UpdateProfileDto, UserRole};
use crate::utils::{validate_full_name, ApiResponse, ApiError};

#[openapi(tag = "Profile")]
#[get("/profile")]
pub async fn get_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let profile = db
        .collection::<Profile>("profiles")
        .find_one(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    let binding = db
        .collection::<RoleBinding>("user_roles")
        .find_one(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let role = binding.map(|b| b.role).unwrap_or(UserRole::Customer);

    Ok(Json(ApiResponse::success(serde_json::json!({
        "profile": ProfileResponse::from(profile),
        "role": role
    }))))
}

#[openapi(tag = "Profile")]
#[put("/profile", data = "<dto>")]
pub async fn update_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<UpdateProfileDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if let Some(ref full_name) = dto.full_name {
        if !validate_full_name(full_name) {
            return Err(ApiError::bad_request("Name must be 2 to 100 characters"));
        }
    }

    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref full_name) = dto.full_name {
        update_doc.insert("full_name", full_name.trim());
    }
    if let Some(ref phone) = dto.phone {
        update_doc.insert("phone", phone);
    }
    if let Some(ref avatar_url) = dto.avatar_url {
        update_doc.insert("avatar_url", avatar_url);
    }

    let result = db
        .collection::<Profile>("profiles")
        .update_one(
            doc! { "user_id": auth.user_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update profile: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Profile not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Profile updated successfully"
    }))))
}
