//! # Evently Config
//!
//! Configuration types for the Evently API, loaded from environment variables:
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`server`]: Bind address of the HTTP server
//! - [`store`]: Which data store backend to run against
//!
//! Cache settings live next to the cache itself in `evently-cache`.
//!
//! # Example
//!
//! ```ignore
//! use evently_config::{CorsConfig, ServerConfig, StoreConfig};
//!
//! let cors_config = CorsConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! let store_config = StoreConfig::from_env();
//! ```

pub mod cors;
pub mod server;
pub mod store;

pub use cors::CorsConfig;
pub use server::ServerConfig;
pub use store::{StoreBackend, StoreConfig};
