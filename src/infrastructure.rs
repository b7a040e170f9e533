//! Infrastructure layer for configuration, logging and the remote backends
//!
//! This module provides the configuration manager, logging setup, the HTTP
//! client, the HTTP implementation of the remote contracts and an in-memory
//! remote used by offline runs and tests.

pub mod config; // Configuration tiers, defaults and endpoint helpers
pub mod fixture_remote; // In-memory catalog + favorites backend
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod pokemon_remote;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use fixture_remote::{InMemoryRemote, RemoteCall};
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use pokemon_remote::PokemonRemote;
