use rocket::serde::json::Json;
use rocket::State;
use mongodb::bson::{doc, DateTime};

use crate::db::{self, DbConn};
use crate::models::{
    LoginDto, Profile, RegisterDto, RoleBinding, User, UserResponse, UserRole, Worker,
};
use crate::services::JwtService;
use crate::utils::{validate_email, validate_full_name, validate_password, ApiResponse, ApiError};

/// --------------------
/// Register
/// --------------------
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    db: &State<DbConn>,
    dto: Json<RegisterDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_full_name(&dto.full_name) {
        return Err(ApiError::bad_request("Name must be 2 to 100 characters"));
    }
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if !validate_password(&dto.password) {
        return Err(ApiError::bad_request("Password must be at least 6 characters"));
    }

    let email = dto.email.trim().to_lowercase();

    let existing = db
        .collection::<User>("users")
        .find_one(doc! { "email": &email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("Email is already registered"));
    }

    let password_hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))?;

    let now = DateTime::now();
    let user = User {
        id: None,
        email: email.clone(),
        password_hash,
        is_active: true,
        last_login_at: now,
        created_at: now,
        updated_at: now,
    };

    // The unique email index still guards against two concurrent signups.
    let result = match db.collection::<User>("users").insert_one(&user, None).await {
        Ok(r) => r,
        Err(e) if db::is_duplicate_key_error(&e) => {
            return Err(ApiError::bad_request("Email is already registered"));
        }
        Err(e) => return Err(ApiError::internal_error(format!("Failed to create user: {}", e))),
    };

    let user_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Invalid user ID"))?;

    let profile = Profile {
        id: None,
        user_id,
        full_name: dto.full_name.trim().to_string(),
        email: email.clone(),
        phone: None,
        avatar_url: None,
        created_at: now,
        updated_at: now,
    };

    db.collection::<Profile>("profiles")
        .insert_one(&profile, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create profile: {}", e)))?;

    let role = if dto.is_worker {
        UserRole::Worker
    } else {
        UserRole::Customer
    };

    db.collection::<RoleBinding>("user_roles")
        .insert_one(&RoleBinding { id: None, user_id, role }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to assign role: {}", e)))?;

    if dto.is_worker {
        db.collection::<Worker>("workers")
            .insert_one(&Worker::new(user_id), None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to create worker: {}", e)))?;
    }

    let access_token = JwtService::generate_access_token(&user_id, &email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let user = UserResponse {
        id: user_id.to_hex(),
        email,
        full_name: profile.full_name,
        role,
    };

    Ok(Json(ApiResponse::success_with_message(
        "Registration successful".to_string(),
        serde_json::json!({
            "user": user,
            "accessToken": access_token,
            "refreshToken": refresh_token
        }),
    )))
}

/// --------------------
/// Login
/// --------------------
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    dto: Json<LoginDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let email = dto.email.trim().to_lowercase();

    let user = db
        .collection::<User>("users")
        .find_one(doc! { "email": &email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let valid = bcrypt::verify(&dto.password, &user.password_hash)
        .map_err(|e| ApiError::internal_error(format!("Failed to verify password: {}", e)))?;

    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    if !user.is_active {
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("Invalid user ID"))?;

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": { "last_login_at": DateTime::now() } },
            None,
        )
        .await
        .ok();

    let binding = db
        .collection::<RoleBinding>("user_roles")
        .find_one(doc! { "user_id": user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let role = binding.map(|b| b.role).unwrap_or(UserRole::Customer);

    let profile = db
        .collection::<Profile>("profiles")
        .find_one(doc! { "user_id": user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let full_name = profile.map(|p| p.full_name).unwrap_or_default();

    let access_token = JwtService::generate_access_token(&user_id, &email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let user = UserResponse {
        id: user_id.to_hex(),
        email,
        full_name,
        role,
    };

    Ok(Json(ApiResponse::success_with_message(
        "Login successful".to_string(),
        serde_json::json!({
            "user": user,
            "accessToken": access_token,
            "refreshToken": refresh_token
        }),
    )))
}

/// --------------------
/// Silent Refresh Token
/// --------------------
#[derive(serde::Deserialize)]
pub struct RefreshTokenDto {
    pub refresh_token: String,
}

#[post("/auth/refresh", data = "<dto>")]
pub async fn refresh_token(
    dto: Json<RefreshTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let claims = JwtService::verify_token(&dto.refresh_token, true)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let user_id = mongodb::bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid user id in token"))?;

    let access = JwtService::generate_access_token(&user_id, &claims.email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "accessToken": access
    }))))
}
