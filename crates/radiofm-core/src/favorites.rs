//! The device's favorite stations.
//!
//! `FavoritesStore` owns the in-memory list, mirrors it to a
//! [`KeyValueStore`] after every mutation, and stamps `is_favorite` onto
//! station catalogs. Storage problems never fail an operation: they are
//! logged and published as [`StoreEvent::StorageFailed`], and the in-memory
//! list stays as the caller left it.

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::events::{StoreEvent, EVENT_CHANNEL_CAPACITY};
use crate::identity::{IdentityKey, IdentityPolicy};
use crate::record;
use crate::station::Station;
use crate::storage::{KeyValueStore, FAVORITES_KEY};

/// Outcome of [`FavoritesStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records dropped because they failed to decode or duplicated an
    /// earlier record.
    pub skipped: usize,
}

pub struct FavoritesStore<S> {
    storage: S,
    policy: IdentityPolicy,
    favorites: Vec<Station>,
    events: broadcast::Sender<StoreEvent>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Create an empty store. Call [`load`](Self::load) to read what was
    /// persisted.
    pub fn new(storage: S, policy: IdentityPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            policy,
            favorites: Vec::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn favorites(&self) -> &[Station] {
        &self.favorites
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Replace the in-memory favorites with what storage holds.
    pub fn load(&mut self) -> LoadReport {
        let blobs = match self.storage.get(FAVORITES_KEY) {
            Ok(Some(blobs)) => blobs,
            Ok(None) => {
                debug!("No favorites found in storage");
                self.favorites.clear();
                self.emit(StoreEvent::Loaded { count: 0 });
                return LoadReport::default();
            }
            Err(e) => {
                error!("Failed to read favorites: {}", e);
                self.emit(StoreEvent::StorageFailed {
                    message: e.to_string(),
                });
                return LoadReport {
                    loaded: self.favorites.len(),
                    skipped: 0,
                };
            }
        };

        let mut favorites: Vec<Station> = Vec::with_capacity(blobs.len());
        let mut skipped = 0;
        for (index, blob) in blobs.iter().enumerate() {
            let mut station = match record::decode(blob) {
                Ok(station) => station,
                Err(e) => {
                    warn!("Skipping favorite record {}: {}", index, e);
                    skipped += 1;
                    self.emit(StoreEvent::RecordSkipped {
                        index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if favorites
                .iter()
                .any(|f| f.same_identity(&station, self.policy))
            {
                debug!(
                    "Dropping duplicate favorite {} under {} policy",
                    station.name,
                    self.policy.label()
                );
                skipped += 1;
                continue;
            }

            station.is_favorite = true;
            favorites.push(station);
        }

        self.favorites = favorites;
        info!(
            "Loaded {} favorites ({} skipped)",
            self.favorites.len(),
            skipped
        );
        self.emit(StoreEvent::Loaded {
            count: self.favorites.len(),
        });

        LoadReport {
            loaded: self.favorites.len(),
            skipped,
        }
    }

    /// Add `station` as a favorite. Returns `false` (and writes nothing) if a
    /// station with the same identity is already stored.
    pub fn add(&mut self, mut station: Station) -> bool {
        if self.contains(&station) {
            debug!(
                "{} already in favorites, insert ignored",
                station.identity_key(self.policy)
            );
            return false;
        }

        station.is_favorite = true;
        let name = station.name.clone();
        self.favorites.push(station);
        debug!("Added {} to favorites", name);
        self.emit(StoreEvent::Added { name });
        self.synchronize();
        true
    }

    /// Remove the favorite with `station`'s identity. Storage is rewritten
    /// whether or not anything matched.
    pub fn remove(&mut self, station: &Station) -> bool {
        let policy = self.policy;
        let key = station.identity_key(policy);
        self.remove_where(&key, |f| policy.same_station(f, station))
    }

    /// Remove every favorite carrying `key`. Storage is rewritten whether or
    /// not anything matched.
    pub fn remove_key(&mut self, key: &IdentityKey) -> bool {
        self.remove_where(key, |f| key.matches(f))
    }

    fn remove_where<F>(&mut self, key: &IdentityKey, is_match: F) -> bool
    where
        F: Fn(&Station) -> bool,
    {
        let mut removed = Vec::new();
        self.favorites.retain(|f| {
            if is_match(f) {
                removed.push(f.name.clone());
                false
            } else {
                true
            }
        });

        if removed.is_empty() {
            debug!("{} not in favorites, nothing removed", key);
        }
        for name in &removed {
            debug!("Removed {} from favorites", name);
            self.emit(StoreEvent::Removed { name: name.clone() });
        }

        self.synchronize();
        !removed.is_empty()
    }

    /// Flip favorite status. Returns the new status.
    pub fn toggle(&mut self, station: Station) -> bool {
        if self.contains(&station) {
            self.remove(&station);
            false
        } else {
            self.add(station)
        }
    }

    pub fn contains(&self, station: &Station) -> bool {
        self.favorites
            .iter()
            .any(|f| self.policy.same_station(f, station))
    }

    /// Copy of `catalog` with `is_favorite` set on every entry that is a
    /// favorite. Entries are never added, dropped, reordered, or unmarked.
    pub fn filter(&self, catalog: &[Station]) -> Vec<Station> {
        if self.favorites.is_empty() {
            return catalog.to_vec();
        }

        catalog
            .iter()
            .map(|station| {
                let mut station = station.clone();
                if self.contains(&station) {
                    station.is_favorite = true;
                }
                station
            })
            .collect()
    }

    pub fn get_station(&self, name: &str) -> Option<&Station> {
        self.favorites.iter().find(|f| f.name == name)
    }

    pub fn get_station_at(&self, index: usize) -> Option<&Station> {
        self.favorites.get(index)
    }

    /// Write every favorite to storage. Returns whether the write landed;
    /// failures are logged and published, never returned.
    pub fn synchronize(&self) -> bool {
        let blobs = match self
            .favorites
            .iter()
            .map(record::encode)
            .collect::<crate::Result<Vec<String>>>()
        {
            Ok(blobs) => blobs,
            Err(e) => {
                error!("Failed to encode favorites: {}", e);
                self.emit(StoreEvent::StorageFailed {
                    message: e.to_string(),
                });
                return false;
            }
        };

        let count = blobs.len();
        match self.storage.set(FAVORITES_KEY, blobs) {
            Ok(()) => {
                debug!("Stored {} favorites", count);
                self.emit(StoreEvent::Synchronized { count });
                true
            }
            Err(e) => {
                error!("Failed to sync favorites to storage: {}", e);
                self.emit(StoreEvent::StorageFailed {
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
