//! Logging setup for artmgr
//!
//! The library crates only emit `tracing` events; the binary picks the
//! format and the filter once at startup.
//!
//! - **Formats**: pretty, compact and JSON
//! - **Filtering**: an explicit level wins, then `RUST_LOG`, then `warn`
//! - **Verbosity**: [`level_for_verbosity`] turns `-v`/`-q` counts into a level
//!
//! # Example
//!
//! ```no_run
//! use artmgr_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Compact, Some("info")).unwrap();
//! tracing::info!(branch = "main", "upload complete");
//! ```

pub mod config;
pub mod initialization;

pub use config::{level_for_verbosity, LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
