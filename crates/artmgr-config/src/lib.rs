// Copyright (C) 2026  artmgr Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Configuration for artmgr
//!
//! Two kinds of configuration live here:
//!
//! - repository options ([`RepoOptions`]), negotiated from three layers:
//!   built-in defaults, the `options` file persisted in the repository and
//!   caller overrides, with later layers winning field by field
//! - session [`Settings`], loaded once from an optional TOML file and
//!   `ARTMGR_*` environment variables
//!
//! # Example
//!
//! ```
//! use artmgr_config::{negotiate, parse_persisted, OptionOverrides, RepoOptions, REPOSITORY_VERSION};
//!
//! let persisted = parse_persisted("[general]\nminimum_size = 1024\n", REPOSITORY_VERSION).unwrap();
//! let overrides = OptionOverrides { derive_from_vcs_ignore: Some(true), ..Default::default() };
//! let options = negotiate(&RepoOptions::default(), &persisted, &overrides);
//!
//! assert_eq!(options.minimum_size, 1024);
//! assert!(options.derive_from_vcs_ignore);
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

// Re-export commonly used items
pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_overrides_with, negotiate, parse_persisted, render_options, SettingsLoader};
pub use schema::*;
pub use validation::Validator;
