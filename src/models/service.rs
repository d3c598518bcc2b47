use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

/// Category vocabulary matching the `category` values persisted on worker
/// and service documents.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Garden,
    Handyman,
    Cleaning,
    Moving,
    Craft,
    Tech,
    Care,
    Auto,
    Events,
    B2b,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 10] = [
        ServiceCategory::Garden,
        ServiceCategory::Handyman,
        ServiceCategory::Cleaning,
        ServiceCategory::Moving,
        ServiceCategory::Craft,
        ServiceCategory::Tech,
        ServiceCategory::Care,
        ServiceCategory::Auto,
        ServiceCategory::Events,
        ServiceCategory::B2b,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Garden => "garden",
            ServiceCategory::Handyman => "handyman",
            ServiceCategory::Cleaning => "cleaning",
            ServiceCategory::Moving => "moving",
            ServiceCategory::Craft => "craft",
            ServiceCategory::Tech => "tech",
            ServiceCategory::Care => "care",
            ServiceCategory::Auto => "auto",
            ServiceCategory::Events => "events",
            ServiceCategory::B2b => "b2b",
        }
    }

    /// Display label shown to customers. Search queries are matched
    /// against these as well as raw document fields.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Garden => "Zahrada & exteriér",
            ServiceCategory::Handyman => "Dům & byt",
            ServiceCategory::Cleaning => "Úklid & domácnost",
            ServiceCategory::Moving => "Stěhování & logistika",
            ServiceCategory::Craft => "Specializované řemeslo",
            ServiceCategory::Tech => "Technika & IT",
            ServiceCategory::Care => "Péče & výpomoc",
            ServiceCategory::Auto => "Auto & doprava",
            ServiceCategory::Events => "Eventy & lifestyle",
            ServiceCategory::B2b => "Pro firmy",
        }
    }

    pub fn parse(s: &str) -> Option<ServiceCategory> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub worker_id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: ServiceCategory,
    pub created_at: DateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_every_persisted_value() {
        for cat in ServiceCategory::ALL {
            assert_eq!(ServiceCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(ServiceCategory::parse("plumbing"), None);
    }

    #[test]
    fn serde_rename_matches_as_str() {
        let json = serde_json::to_string(&ServiceCategory::B2b).unwrap();
        assert_eq!(json, "\"b2b\"");
    }
}
