//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, duplicate detection)
//!     → DaemonConfig (validated, immutable)
//!     → bind_specs() expands port lists into per-listener specs
//!
//! On rehash:
//!     watcher.rs detects change (or SIGHUP forces a reload)
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<DaemonConfig>
//!     → reconciler adjusts listeners to the new bind set
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - A config that fails validation never replaces the running one
//! - Duplicate (address, port) pairs are rejected here, before any
//!   socket work happens

pub mod loader;
pub mod ports;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{BindConfig, DaemonConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
