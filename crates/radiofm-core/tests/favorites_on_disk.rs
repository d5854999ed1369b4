use radiofm_core::catalog::{CatalogProvider, StaticCatalog};
use radiofm_core::events::StoreEvent;
use radiofm_core::storage::{JsonFileStore, KeyValueStore, FAVORITES_KEY};
use radiofm_core::{FavoritesStore, IdentityPolicy, Station};
use std::path::Path;

const RNE_URL: &str = "http://rne-hls.example/playlist.m3u8";
const RAC_URL: &str = "http://rac105.example/live";

fn open(path: &Path, policy: IdentityPolicy) -> FavoritesStore<JsonFileStore> {
    let mut store = FavoritesStore::new(JsonFileStore::new(path), policy);
    store.load();
    store
}

#[test]
fn empty_storage_loads_empty_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");

    let mut store = FavoritesStore::new(JsonFileStore::new(&path), IdentityPolicy::NameAndUrl);
    let mut rx = store.subscribe();
    let report = store.load();

    assert_eq!(report.loaded, 0);
    assert!(store.is_empty());
    assert_eq!(rx.try_recv().unwrap(), StoreEvent::Loaded { count: 0 });
    assert!(!path.exists());
}

#[test]
fn duplicate_add_leaves_single_entry_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");

    let mut store = open(&path, IdentityPolicy::NameAndUrl);
    store.add(Station::new("RNE", RNE_URL));
    store.add(Station::new("RNE", RNE_URL));

    let reopened = open(&path, IdentityPolicy::NameAndUrl);
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.get_station_at(0).unwrap().name, "RNE");
}

#[test]
fn removal_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");

    let mut store = open(&path, IdentityPolicy::NameAndUrl);
    store.add(Station::new("RNE", RNE_URL));
    store.add(Station::new("RAC105", RAC_URL));
    assert!(store.remove(&Station::new("RNE", RNE_URL)));

    let reopened = open(&path, IdentityPolicy::NameAndUrl);
    assert!(reopened.get_station("RNE").is_none());
    assert!(reopened.get_station("RAC105").is_some());
}

#[test]
fn url_policy_rejects_second_station_on_same_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");

    let mut store = open(&path, IdentityPolicy::Url);
    assert!(store.add(Station::new("Radio Voz", "dup-url")));
    assert!(!store.add(Station::new("Other", "dup-url")));

    let blobs = JsonFileStore::new(&path).get(FAVORITES_KEY).unwrap().unwrap();
    assert_eq!(blobs.len(), 1);
}

#[test]
fn every_field_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");

    let station = Station {
        identifier: 9,
        name: "Radio Voz".to_string(),
        url: "http://voz.example".to_string(),
        icon_name: "voz".to_string(),
        artwork: "voz-art".to_string(),
        popularity: "3".to_string(),
        description: "Talk".to_string(),
        country_id: "ES".to_string(),
        image_url: "http://img.example/voz.png".to_string(),
        parent_station: 2,
        is_enabled: true,
        is_geoblocked: true,
        date_created: "2018-11-12".to_string(),
        date_updated: "2018-11-14".to_string(),
        is_favorite: true,
    };

    let mut store = open(&path, IdentityPolicy::Identifier);
    store.add(station.clone());

    let reopened = open(&path, IdentityPolicy::Identifier);
    assert_eq!(reopened.favorites(), &[station]);
}

#[test]
fn legacy_records_load_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");
    std::fs::write(
        &path,
        r#"{"favorites": [
            "{\"name\":\"RNE\",\"url\":\"http://rne-hls.example/playlist.m3u8\"}",
            "42",
            "{\"name\":\"RAC105\",\"url\":\"http://rac105.example/live\",\"iconName\":\"rac\"}"
        ]}"#,
    )
    .unwrap();

    let mut store = FavoritesStore::new(JsonFileStore::new(&path), IdentityPolicy::NameAndUrl);
    let report = store.load();

    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(store.get_station("RNE").unwrap().icon_name, "radio");
    assert_eq!(store.get_station("RAC105").unwrap().icon_name, "rac");
}

#[test]
fn corrupt_document_reports_storage_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");
    std::fs::write(&path, "{ definitely not json").unwrap();

    let mut store = FavoritesStore::new(JsonFileStore::new(&path), IdentityPolicy::NameAndUrl);
    let mut rx = store.subscribe();
    let report = store.load();

    assert_eq!(report.loaded, 0);
    assert!(matches!(
        rx.try_recv().unwrap(),
        StoreEvent::StorageFailed { .. }
    ));
}

#[tokio::test]
async fn catalog_is_annotated_without_reordering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");

    let mut store = open(&path, IdentityPolicy::NameAndUrl);
    store.add(Station::new("RNE", RNE_URL));

    let catalog = StaticCatalog::from_stations(vec![
        Station::new("RAC105", RAC_URL),
        Station::new("RNE", RNE_URL),
        Station::new("Radio Voz", "http://voz.example"),
    ]);
    let stations = catalog.stations(None).await.unwrap();
    let annotated = store.filter(&stations);

    let names: Vec<&str> = annotated.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["RAC105", "RNE", "Radio Voz"]);
    let flags: Vec<bool> = annotated.iter().map(|s| s.is_favorite).collect();
    assert_eq!(flags, vec![false, true, false]);
}

#[test]
fn bad_entries_are_skipped_one_by_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");
    let blob = radiofm_core::record::encode(&Station::new("RNE", RNE_URL)).unwrap();
    let rne = serde_json::to_string(&blob).unwrap();
    std::fs::write(
        &path,
        format!(
            r#"{{"favorites": [{}, 42, {{"name": "RAC105", "url": "{}"}}, null]}}"#,
            rne, RAC_URL
        ),
    )
    .unwrap();

    let mut store = FavoritesStore::new(JsonFileStore::new(&path), IdentityPolicy::NameAndUrl);
    let mut rx = store.subscribe();
    let report = store.load();

    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(store.get_station_at(0).unwrap().name, "RNE");
    assert_eq!(store.get_station_at(1).unwrap().name, "RAC105");
    assert!(matches!(
        rx.try_recv().unwrap(),
        StoreEvent::RecordSkipped { index: 1, .. }
    ));
}

#[test]
fn add_after_unreadable_document_writes_fresh_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");
    std::fs::write(&path, "{ broken").unwrap();

    let mut store = FavoritesStore::new(JsonFileStore::new(&path), IdentityPolicy::NameAndUrl);
    store.load();
    let mut rx = store.subscribe();

    assert!(store.add(Station::new("RNE", RNE_URL)));
    assert!(store.synchronize());
    while let Ok(event) = rx.try_recv() {
        assert!(!matches!(event, StoreEvent::StorageFailed { .. }));
    }

    let reopened = open(&path, IdentityPolicy::NameAndUrl);
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.get_station_at(0).unwrap().name, "RNE");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("favorites.json.corrupt")).unwrap(),
        "{ broken"
    );
}
