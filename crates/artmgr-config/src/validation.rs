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
use crate::error::{ConfigError, ConfigResult};
use crate::schema::{RepoOptions, Settings};

/// Validator for configuration values
pub trait Validator {
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for RepoOptions {
    fn validate(&self) -> ConfigResult<()> {
        if self.version == 0 {
            return Err(ConfigError::invalid_value(
                "version",
                "version must be at least 1",
            ));
        }

        if let Some(position) = self
            .extension_allowlist
            .iter()
            .position(|ext| ext.trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::invalid_value(
                "extension_allowlist",
                format!("entry {} is empty", position + 1),
            ));
        }

        if self.explicit_files.iter().any(|pattern| pattern.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "explicit_files",
                "patterns must not be empty",
            ));
        }

        Ok(())
    }
}

impl Validator for Settings {
    fn validate(&self) -> ConfigResult<()> {
        if self.share_domain.trim().is_empty() {
            return Err(ConfigError::MissingRequired("share_domain".to_string()));
        }

        if matches!(&self.server, Some(server) if server.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "server",
                "address must not be empty when set",
            ));
        }

        if self.default_options.version > self.supported_version {
            return Err(ConfigError::UnsupportedVersion {
                found: i64::from(self.default_options.version),
                supported: self.supported_version,
            });
        }

        self.default_options.validate()
    }
}
