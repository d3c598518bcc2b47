use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use serde::de::DeserializeOwned;
use std::env;

/// Figment-backed settings: `Rocket.toml` profile sections overridden by
/// `ROCKET_`-prefixed environment variables.
pub struct Config;

impl Config {
    fn profile() -> String {
        env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string())
    }

    fn figment() -> Figment {
        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(Self::profile())
            .merge(Env::prefixed("ROCKET_").split("_"))
    }

    fn extract_or<T: DeserializeOwned>(key: &str, default: T) -> T {
        Self::figment().extract_inner(key).unwrap_or(default)
    }

    pub fn jwt_secret() -> String {
        Self::extract_or("jwt_secret", "default-secret".to_string())
    }

    pub fn jwt_refresh_secret() -> String {
        Self::extract_or("jwt_refresh_secret", "default-refresh-secret".to_string())
    }

    /// Access-token lifetime in seconds.
    pub fn jwt_expiry() -> i64 {
        Self::extract_or("jwt_expiry", 900)
    }

    /// Refresh-token lifetime in seconds.
    pub fn jwt_refresh_expiry() -> i64 {
        Self::extract_or("jwt_refresh_expiry", 604800)
    }

    pub fn mongodb_uri() -> String {
        Self::extract_or("mongodb_uri", "mongodb://localhost:27017/majstr".to_string())
    }

    pub fn is_development() -> bool {
        Self::profile() == "development"
    }
}
