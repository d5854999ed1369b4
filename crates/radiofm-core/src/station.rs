use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{IdentityKey, IdentityPolicy};

/// Asset used when a station carries no icon of its own.
pub const DEFAULT_ICON_NAME: &str = "radio";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Backend id, `0` when the station did not come from the backend.
    #[serde(default)]
    pub identifier: u64,
    pub name: String,
    /// Stream endpoint handed to the player as-is.
    pub url: String,
    #[serde(default = "default_icon_name")]
    pub icon_name: String,
    #[serde(default)]
    pub artwork: String,
    #[serde(default)]
    pub popularity: String,
    /// Short description / category
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub parent_station: u64,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_geoblocked: bool,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub date_updated: String,
    #[serde(default)]
    pub is_favorite: bool,
}

fn default_icon_name() -> String {
    DEFAULT_ICON_NAME.to_string()
}

impl Default for Station {
    fn default() -> Self {
        Self {
            identifier: 0,
            name: String::new(),
            url: String::new(),
            icon_name: default_icon_name(),
            artwork: String::new(),
            popularity: String::new(),
            description: String::new(),
            country_id: String::new(),
            image_url: String::new(),
            parent_station: 0,
            is_enabled: false,
            is_geoblocked: false,
            date_created: String::new(),
            date_updated: String::new(),
            is_favorite: false,
        }
    }
}

impl Station {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Build a station from one element of a backend `stations` response.
    ///
    /// Keys that are missing or carry the wrong JSON type keep their default.
    /// Returns `None` if `value` is not an object.
    pub fn from_payload(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut station = Self::default();

        if let Some(v) = obj.get("id").and_then(Value::as_u64) {
            station.identifier = v;
        }
        if let Some(v) = obj.get("name").and_then(Value::as_str) {
            station.name = v.to_string();
        }
        if let Some(v) = obj
            .get("url")
            .or_else(|| obj.get("stream"))
            .and_then(Value::as_str)
        {
            station.url = v.to_string();
        }
        if let Some(v) = obj.get("description").and_then(Value::as_str) {
            station.description = v.to_string();
        }
        if let Some(v) = obj.get("station_parent").and_then(Value::as_u64) {
            station.parent_station = v;
        }
        if let Some(v) = obj.get("created_at").and_then(Value::as_str) {
            station.date_created = v.to_string();
        }
        if let Some(v) = obj.get("updated_at").and_then(Value::as_str) {
            station.date_updated = v.to_string();
        }
        if let Some(v) = obj.get("geoblocked").and_then(Value::as_i64) {
            station.is_geoblocked = v != 0;
        }
        if let Some(v) = obj.get("country_id").and_then(Value::as_str) {
            station.country_id = v.to_string();
        }
        if let Some(v) = obj.get("enabled").and_then(Value::as_i64) {
            station.is_enabled = v != 0;
        }
        if let Some(v) = obj.get("image").and_then(Value::as_str) {
            station.image_url = v.to_string();
        }

        Some(station)
    }

    pub fn identity_key(&self, policy: IdentityPolicy) -> IdentityKey {
        IdentityKey::of(self, policy)
    }

    pub fn same_identity(&self, other: &Station, policy: IdentityPolicy) -> bool {
        policy.same_station(self, other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Country {
    #[serde(default)]
    pub identifier: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub localized_name: String,
    #[serde(default)]
    pub iso_code: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub date_updated: String,
}

impl Country {
    /// Build a country from one element of a backend `countries` response.
    pub fn from_payload(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };

        Some(Self {
            identifier: obj.get("id").and_then(Value::as_u64).unwrap_or_default(),
            name: text("name"),
            localized_name: text("nombre"),
            iso_code: text("iso"),
            image_url: text("image"),
            date_created: text("created_at"),
            date_updated: text("updated_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_station_defaults() {
        let s = Station::new("RNE", "http://rne-hls.example/playlist.m3u8");
        assert_eq!(s.icon_name, "radio");
        assert_eq!(s.artwork, "");
        assert_eq!(s.popularity, "");
        assert!(!s.is_favorite);
        assert_eq!(s.identifier, 0);
    }

    #[test]
    fn test_station_from_payload() {
        let payload = json!({
            "id": 12,
            "name": "Cadena SER",
            "url": "http://ser.example/live",
            "description": "News",
            "station_parent": 3,
            "created_at": "2018-11-12 10:00:00",
            "updated_at": "2018-11-13 10:00:00",
            "geoblocked": 1,
            "country_id": "ES",
            "enabled": 1,
            "image": "http://img.example/ser.png"
        });
        let s = Station::from_payload(&payload).unwrap();
        assert_eq!(s.identifier, 12);
        assert_eq!(s.name, "Cadena SER");
        assert_eq!(s.url, "http://ser.example/live");
        assert_eq!(s.description, "News");
        assert_eq!(s.parent_station, 3);
        assert_eq!(s.date_created, "2018-11-12 10:00:00");
        assert!(s.is_geoblocked);
        assert!(s.is_enabled);
        assert_eq!(s.country_id, "ES");
        assert_eq!(s.image_url, "http://img.example/ser.png");
        assert_eq!(s.icon_name, DEFAULT_ICON_NAME);
        assert!(!s.is_favorite);
    }

    #[test]
    fn test_station_payload_wrong_types_keep_defaults() {
        let payload = json!({ "id": "twelve", "name": 5, "enabled": "yes" });
        let s = Station::from_payload(&payload).unwrap();
        assert_eq!(s.identifier, 0);
        assert_eq!(s.name, "");
        assert!(!s.is_enabled);

        assert!(Station::from_payload(&json!(["not", "an", "object"])).is_none());
    }

    #[test]
    fn test_country_from_payload() {
        let payload = json!({
            "id": 34,
            "name": "Spain",
            "nombre": "España",
            "iso": "ES",
            "image": "http://img.example/es.png",
            "created_at": "a",
            "updated_at": "b"
        });
        let c = Country::from_payload(&payload).unwrap();
        assert_eq!(c.identifier, 34);
        assert_eq!(c.name, "Spain");
        assert_eq!(c.localized_name, "España");
        assert_eq!(c.iso_code, "ES");
        assert_eq!(c.date_created, "a");
        assert_eq!(c.date_updated, "b");
    }

    #[test]
    fn test_same_identity_depends_on_policy() {
        let a = Station::new("Radio Voz", "dup-url");
        let b = Station::new("Other", "dup-url");
        assert!(a.same_identity(&b, IdentityPolicy::Url));
        assert!(!a.same_identity(&b, IdentityPolicy::Name));
        assert!(!a.same_identity(&b, IdentityPolicy::NameAndUrl));
    }
}
