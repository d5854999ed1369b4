//! Persisted form of a favorite station.
//!
//! Every favorite is stored as one self-contained JSON record. Records carry a
//! schema version `v`; anything written before versioning existed decodes as
//! version 1. Optional fields have explicit defaults so older records (and the
//! camelCase spellings they used) keep loading after fields are added.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::station::{Station, DEFAULT_ICON_NAME};

/// Version written by this build.
pub const RECORD_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FavoriteRecord {
    #[serde(default = "legacy_version")]
    v: u32,
    name: String,
    url: String,
    #[serde(default = "default_icon_name", alias = "iconName")]
    icon_name: String,
    #[serde(default)]
    artwork: String,
    #[serde(default)]
    popularity: String,
    #[serde(default, alias = "descriptionStation")]
    description: String,
    #[serde(default)]
    identifier: u64,
    #[serde(default, alias = "countryID")]
    country_id: String,
    #[serde(default, alias = "imageUrl")]
    image_url: String,
    #[serde(default, alias = "parentStation")]
    parent_station: u64,
    #[serde(default, alias = "isEnabled")]
    is_enabled: bool,
    #[serde(default, alias = "isGeoblocked")]
    is_geoblocked: bool,
    #[serde(default, alias = "dateCreated")]
    date_created: String,
    #[serde(default, alias = "dateUpdated")]
    date_updated: String,
    // Anything found in the favorites store is a favorite unless it says otherwise.
    #[serde(default = "default_is_favorite", alias = "isFavorite")]
    is_favorite: bool,
}

fn legacy_version() -> u32 {
    1
}

fn default_icon_name() -> String {
    DEFAULT_ICON_NAME.to_string()
}

fn default_is_favorite() -> bool {
    true
}

impl From<&Station> for FavoriteRecord {
    fn from(s: &Station) -> Self {
        Self {
            v: RECORD_VERSION,
            name: s.name.clone(),
            url: s.url.clone(),
            icon_name: s.icon_name.clone(),
            artwork: s.artwork.clone(),
            popularity: s.popularity.clone(),
            description: s.description.clone(),
            identifier: s.identifier,
            country_id: s.country_id.clone(),
            image_url: s.image_url.clone(),
            parent_station: s.parent_station,
            is_enabled: s.is_enabled,
            is_geoblocked: s.is_geoblocked,
            date_created: s.date_created.clone(),
            date_updated: s.date_updated.clone(),
            is_favorite: s.is_favorite,
        }
    }
}

impl From<FavoriteRecord> for Station {
    fn from(r: FavoriteRecord) -> Self {
        Self {
            identifier: r.identifier,
            name: r.name,
            url: r.url,
            icon_name: r.icon_name,
            artwork: r.artwork,
            popularity: r.popularity,
            description: r.description,
            country_id: r.country_id,
            image_url: r.image_url,
            parent_station: r.parent_station,
            is_enabled: r.is_enabled,
            is_geoblocked: r.is_geoblocked,
            date_created: r.date_created,
            date_updated: r.date_updated,
            is_favorite: r.is_favorite,
        }
    }
}

pub fn encode(station: &Station) -> Result<String> {
    serde_json::to_string(&FavoriteRecord::from(station))
        .map_err(|e| StoreError::Encode(format!("{}: {}", station.name, e)))
}

pub fn decode(blob: &str) -> Result<Station> {
    let value: Value =
        serde_json::from_str(blob).map_err(|e| StoreError::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(StoreError::Decode(format!(
            "expected an object, got {}",
            json_kind(&value)
        )));
    }

    let record: FavoriteRecord =
        serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))?;
    if record.v > RECORD_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: record.v,
            supported: RECORD_VERSION,
        });
    }

    Ok(record.into())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_station() -> Station {
        Station {
            identifier: 42,
            name: "RNE".to_string(),
            url: "http://rne-hls.example/playlist.m3u8".to_string(),
            icon_name: "rne".to_string(),
            artwork: "rne-art".to_string(),
            popularity: "9".to_string(),
            description: "Public".to_string(),
            country_id: "ES".to_string(),
            image_url: "http://img.example/rne.png".to_string(),
            parent_station: 1,
            is_enabled: true,
            is_geoblocked: false,
            date_created: "2018-11-12".to_string(),
            date_updated: "2018-11-13".to_string(),
            is_favorite: true,
        }
    }

    #[test]
    fn test_encode_decode_preserves_every_field() {
        let station = full_station();
        let blob = encode(&station).unwrap();
        assert_eq!(decode(&blob).unwrap(), station);
    }

    #[test]
    fn test_encode_writes_current_version() {
        let blob = encode(&full_station()).unwrap();
        let value: Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(value["v"], RECORD_VERSION);
    }

    #[test]
    fn test_decode_fills_defaults() {
        let s = decode(r#"{"name":"RNE","url":"http://x"}"#).unwrap();
        assert_eq!(s.icon_name, "radio");
        assert_eq!(s.artwork, "");
        assert_eq!(s.popularity, "");
        assert_eq!(s.identifier, 0);
        assert!(s.is_favorite);
    }

    #[test]
    fn test_decode_legacy_spellings() {
        let blob = r#"{
            "name": "RAC105",
            "url": "http://rac105.example",
            "iconName": "rac",
            "descriptionStation": "Music",
            "isFavorite": false
        }"#;
        let s = decode(blob).unwrap();
        assert_eq!(s.icon_name, "rac");
        assert_eq!(s.description, "Music");
        assert!(!s.is_favorite);
    }

    #[test]
    fn test_decode_rejects_missing_required_fields() {
        assert!(matches!(
            decode(r#"{"url":"http://x"}"#),
            Err(StoreError::Decode(_))
        ));
        assert!(matches!(decode("not json"), Err(StoreError::Decode(_))));
        assert!(matches!(decode("[1,2]"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let err = decode(r#"{"v":99,"name":"RNE","url":"http://x"}"#).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedVersion {
                found: 99,
                supported: RECORD_VERSION
            }
        ));
    }
}
