//! Domain module - Core business logic and entities
//!
//! This module contains the canonical item record, the raw payload shapes and
//! their normalizer, pagination arithmetic, the error taxonomy, and the remote
//! service contracts.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod damage_relations;
pub mod errors;
pub mod item;
pub mod listing;
pub mod normalizer;
pub mod pagination;
pub mod payload;
pub mod services;

// Re-export commonly used items for convenience
pub use damage_relations::DamageRelations;
pub use errors::{SyncError, SyncResult};
pub use item::{ItemRecord, ItemStat};
pub use listing::{ItemRef, PageListing};
pub use normalizer::{normalize, normalize_value};
pub use pagination::{DEFAULT_PAGE_SIZE, PageRequest, Paginator, derive_page};
pub use payload::RawItem;
pub use services::{CatalogRemote, FavoritesRemote};
