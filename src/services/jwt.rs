use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;

use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    fn issue(
        user_id: &ObjectId,
        email: &str,
        secret: &str,
        ttl_seconds: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_hex(),
            email: email.to_string(),
            exp: now + ttl_seconds,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn generate_access_token(
        user_id: &ObjectId,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        Self::issue(user_id, email, &Config::jwt_secret(), Config::jwt_expiry())
    }

    pub fn generate_refresh_token(
        user_id: &ObjectId,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        Self::issue(
            user_id,
            email,
            &Config::jwt_refresh_secret(),
            Config::jwt_refresh_expiry(),
        )
    }

    /// Access and refresh tokens are signed with different secrets, so a
    /// refresh token can never pass as an access token.
    pub fn verify_token(token: &str, is_refresh: bool) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = if is_refresh {
            Config::jwt_refresh_secret()
        } else {
            Config::jwt_secret()
        };

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips() {
        let user_id = ObjectId::new();
        let token = JwtService::generate_access_token(&user_id, "jana@seznam.cz").unwrap();

        let claims = JwtService::verify_token(&token, false).unwrap();
        assert_eq!(claims.sub, user_id.to_hex());
        assert_eq!(claims.email, "jana@seznam.cz");
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let user_id = ObjectId::new();
        let token = JwtService::generate_refresh_token(&user_id, "jana@seznam.cz").unwrap();

        assert!(JwtService::verify_token(&token, true).is_ok());
        assert!(JwtService::verify_token(&token, false).is_err());
    }
}
