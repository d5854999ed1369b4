pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod favorites;
pub mod identity;
pub mod platform;
pub mod record;
pub mod station;
pub mod storage;

pub use error::{Result, StoreError};
pub use favorites::FavoritesStore;
pub use identity::{IdentityKey, IdentityPolicy};
pub use station::{Country, Station};
