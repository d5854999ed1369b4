//! Station catalogs and the country directory.
//!
//! A catalog is any list of stations the favorites store gets asked to
//! annotate. It may come from the backend, a local TOML/m3u file, or a
//! fixture; the store does not care which.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::station::{Country, Station};

/// Source of stations and countries.
#[allow(async_fn_in_trait)]
pub trait CatalogProvider {
    /// Every station, or only those of the country with ISO code `country`.
    async fn stations(&self, country: Option<&str>) -> Result<Vec<Station>>;
    async fn countries(&self) -> Result<Vec<Country>>;
}

// ── Static catalog ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    stations: Vec<Station>,
    countries: Vec<Country>,
}

impl StaticCatalog {
    pub fn new(stations: Vec<Station>, countries: Vec<Country>) -> Self {
        Self {
            stations,
            countries,
        }
    }

    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self::new(stations, Vec::new())
    }
}

impl CatalogProvider for StaticCatalog {
    async fn stations(&self, country: Option<&str>) -> Result<Vec<Station>> {
        Ok(match country {
            Some(iso) => self
                .stations
                .iter()
                .filter(|s| s.country_id.eq_ignore_ascii_case(iso))
                .cloned()
                .collect(),
            None => self.stations.clone(),
        })
    }

    async fn countries(&self) -> Result<Vec<Country>> {
        Ok(self.countries.clone())
    }
}

// ── Backend catalog ───────────────────────────────────────────────────────────

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the station backend:
///
/// - `GET {origin}/countries`
/// - `GET {origin}/countries/{iso}/stations`
///
/// Responses are a JSON array, or an object wrapping the array in `data`.
pub struct HttpCatalog {
    client: reqwest::Client,
    origin: String,
}

impl HttpCatalog {
    pub fn new(origin: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("radiofm/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn countries_url(&self) -> String {
        format!("{}/countries", self.origin)
    }

    pub fn stations_url(&self, iso: &str) -> String {
        format!("{}/countries/{}/stations", self.origin, iso)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

impl CatalogProvider for HttpCatalog {
    async fn stations(&self, country: Option<&str>) -> Result<Vec<Station>> {
        match country {
            Some(iso) => {
                let body = self.get_json(&self.stations_url(iso)).await?;
                let stations = parse_stations_payload(&body)?;
                info!("Fetched {} stations for {}", stations.len(), iso);
                Ok(stations)
            }
            None => {
                // The backend only lists stations per country.
                let mut all = Vec::new();
                for country in self.countries().await? {
                    if country.iso_code.is_empty() {
                        continue;
                    }
                    let body = self.get_json(&self.stations_url(&country.iso_code)).await?;
                    all.extend(parse_stations_payload(&body)?);
                }
                info!("Fetched {} stations across all countries", all.len());
                Ok(all)
            }
        }
    }

    async fn countries(&self) -> Result<Vec<Country>> {
        let body = self.get_json(&self.countries_url()).await?;
        let countries = parse_countries_payload(&body)?;
        info!("Fetched {} countries", countries.len());
        Ok(countries)
    }
}

fn payload_items(body: &Value) -> Result<&Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => obj
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::Catalog("response object has no `data` array".to_string())),
        _ => Err(StoreError::Catalog(
            "response is neither an array nor an object".to_string(),
        )),
    }
}

pub fn parse_stations_payload(body: &Value) -> Result<Vec<Station>> {
    let items = payload_items(body)?;
    let stations: Vec<Station> = items.iter().filter_map(Station::from_payload).collect();
    if stations.len() < items.len() {
        warn!(
            "Ignored {} non-object station entries",
            items.len() - stations.len()
        );
    }
    Ok(stations)
}

pub fn parse_countries_payload(body: &Value) -> Result<Vec<Country>> {
    let items = payload_items(body)?;
    Ok(items.iter().filter_map(Country::from_payload).collect())
}

// ── Station files ─────────────────────────────────────────────────────────────

/// Load a station list, picking the format from the file extension
/// (`.toml`, otherwise m3u).
pub fn load_stations_from_file(path: &Path) -> Result<Vec<Station>> {
    let content = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let stations = if is_toml {
        parse_stations_from_toml_str(&content)?
    } else {
        parse_m3u_from_str(&content)
    };
    info!("Loaded {} stations from {:?}", stations.len(), path);
    Ok(stations)
}

pub fn parse_m3u_from_str(content: &str) -> Vec<Station> {
    let mut stations = Vec::new();
    let mut pending_name: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#EXTINF:") {
            if let Some(comma_idx) = rest.find(',') {
                pending_name = Some(rest[comma_idx + 1..].trim().to_string());
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let url = line.to_string();
        let name = pending_name.take().unwrap_or_else(|| url.clone());
        stations.push(Station::new(name, url));
    }

    stations
}

/// Matches the TOML `[[station]]` table. Kept apart from `Station` so the
/// file schema stays small and hand-editable.
#[derive(Debug, serde::Deserialize)]
struct TomlStationFile {
    #[serde(default)]
    station: Vec<TomlStation>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlStation {
    name: String,
    url: String,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    artwork: String,
    #[serde(default)]
    popularity: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    country: String,
}

pub fn parse_stations_from_toml_str(content: &str) -> Result<Vec<Station>> {
    let file: TomlStationFile = toml::from_str(content)?;
    Ok(file
        .station
        .into_iter()
        .map(|s| {
            let mut station = Station::new(s.name, s.url);
            station.identifier = s.id;
            if let Some(icon) = s.icon {
                station.icon_name = icon;
            }
            station.artwork = s.artwork;
            station.popularity = s.popularity;
            station.description = s.description;
            station.country_id = s.country;
            station
        })
        .collect())
}

// ── Countries ─────────────────────────────────────────────────────────────────

/// Ordered list of known countries, used to map the device region to a
/// station list.
#[derive(Debug, Clone, Default)]
pub struct CountryDirectory {
    countries: Vec<Country>,
}

impl CountryDirectory {
    pub fn new(countries: Vec<Country>) -> Self {
        Self { countries }
    }

    /// Append countries from another response.
    pub fn extend(&mut self, countries: impl IntoIterator<Item = Country>) {
        let before = self.countries.len();
        self.countries.extend(countries);
        debug!(
            "Stored {} countries ({} new)",
            self.countries.len(),
            self.countries.len() - before
        );
    }

    pub fn get(&self, index: usize) -> Option<&Country> {
        self.countries.get(index)
    }

    pub fn by_iso(&self, iso: Option<&str>) -> Option<&Country> {
        let iso = iso?;
        self.countries
            .iter()
            .find(|c| c.iso_code.eq_ignore_ascii_case(iso))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Country> {
        self.countries.iter()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}
