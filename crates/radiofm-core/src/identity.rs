use serde::{Deserialize, Serialize};

use crate::station::Station;

/// Which fields decide that two station records refer to the same station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// Station name only (oldest stored favorites).
    Name,
    /// Stream url only.
    Url,
    /// Name and url together.
    #[default]
    NameAndUrl,
    /// Backend numeric id. When either side has no id (`identifier == 0`)
    /// the pair is compared by name and url instead, so a favorite saved
    /// before ids existed still matches its backend copy.
    Identifier,
}

impl IdentityPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Url => "url",
            Self::NameAndUrl => "name_and_url",
            Self::Identifier => "identifier",
        }
    }

    /// Whether `a` and `b` are the same station under this policy.
    pub fn same_station(&self, a: &Station, b: &Station) -> bool {
        match self {
            Self::Name => a.name == b.name,
            Self::Url => a.url == b.url,
            Self::NameAndUrl => a.name == b.name && a.url == b.url,
            Self::Identifier if a.identifier != 0 && b.identifier != 0 => {
                a.identifier == b.identifier
            }
            Self::Identifier => a.name == b.name && a.url == b.url,
        }
    }
}

impl std::str::FromStr for IdentityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "url" => Ok(Self::Url),
            "name_and_url" | "name+url" => Ok(Self::NameAndUrl),
            "identifier" | "id" => Ok(Self::Identifier),
            other => Err(format!("unknown identity policy '{}'", other)),
        }
    }
}

/// The comparable part of a station under a given policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Name(String),
    Url(String),
    NameAndUrl(String, String),
    Identifier(u64),
}

impl IdentityKey {
    pub fn of(station: &Station, policy: IdentityPolicy) -> Self {
        match policy {
            IdentityPolicy::Name => Self::Name(station.name.clone()),
            IdentityPolicy::Url => Self::Url(station.url.clone()),
            IdentityPolicy::NameAndUrl => {
                Self::NameAndUrl(station.name.clone(), station.url.clone())
            }
            IdentityPolicy::Identifier if station.identifier != 0 => {
                Self::Identifier(station.identifier)
            }
            IdentityPolicy::Identifier => {
                Self::NameAndUrl(station.name.clone(), station.url.clone())
            }
        }
    }

    /// Whether `station` carries this key, regardless of the policy the key
    /// was built under. A bare `Name` key matches every station with that name.
    pub fn matches(&self, station: &Station) -> bool {
        match self {
            Self::Name(name) => station.name == *name,
            Self::Url(url) => station.url == *url,
            Self::NameAndUrl(name, url) => station.name == *name && station.url == *url,
            Self::Identifier(id) => station.identifier == *id,
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Url(url) => write!(f, "{}", url),
            Self::NameAndUrl(name, url) => write!(f, "{} <{}>", name, url),
            Self::Identifier(id) => write!(f, "#{}", id),
        }
    }
}
