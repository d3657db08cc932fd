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
use crate::schema::{OptionOverrides, RepoOptions, Settings, OPTIONS_SECTION};
use crate::validation::Validator;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use toml::{Table, Value};
use tracing::{debug, info};

/// Persisted key names, current spelling first, legacy spellings after
const VERSION_KEYS: &[&str] = &["version"];
const VCS_IGNORE_KEYS: &[&str] = &["derive_from_vcs_ignore", "git_ignored"];
const MINIMUM_SIZE_KEYS: &[&str] = &["minimum_size", "min_size"];
const EXPLICIT_FILES_KEYS: &[&str] = &["explicit_files", "files"];
const EXTENSIONS_KEYS: &[&str] = &["extension_allowlist", "extensions"];

/// Parse the `options` file persisted in a repository
///
/// The version is checked before anything else: a repository written by a
/// newer format is rejected without looking at its other keys. A missing
/// section or key leaves that option unset.
///
/// Text that is not TOML is read as INI-style `key = value` lines with
/// literal values (`True`, `('cache', 'zip')`), the form older repositories
/// were written in.
///
/// # Errors
///
/// * `TomlParseError` - the text is neither TOML nor INI with a `[general]` section
/// * `UnsupportedVersion` - the declared version exceeds `supported_version`
/// * `InvalidValue` - a present value has the wrong type or range; the
///   error names the key
pub fn parse_persisted(content: &str, supported_version: u32) -> ConfigResult<OptionOverrides> {
    let document: Table = match toml::from_str(content) {
        Ok(document) => document,
        Err(e) => match parse_ini_section(content, OPTIONS_SECTION) {
            Some(section) => {
                debug!("options file is not TOML; read as key = value lines");
                let mut document = Table::new();
                document.insert(OPTIONS_SECTION.to_string(), Value::Table(section));
                document
            }
            None => return Err(e.into()),
        },
    };
    let section = match document.get(OPTIONS_SECTION) {
        None => return Ok(OptionOverrides::default()),
        Some(Value::Table(section)) => section,
        Some(_) => {
            return Err(ConfigError::invalid_value(
                OPTIONS_SECTION,
                "expected a table of options",
            ))
        }
    };

    let version = match lookup(section, VERSION_KEYS) {
        None => None,
        Some((key, Value::Integer(found))) => {
            if *found > i64::from(supported_version) {
                return Err(ConfigError::UnsupportedVersion {
                    found: *found,
                    supported: supported_version,
                });
            }
            let version = u32::try_from(*found)
                .ok()
                .filter(|v| *v >= 1)
                .ok_or_else(|| ConfigError::invalid_value(key, "version must be positive"))?;
            Some(version)
        }
        Some((key, _)) => return Err(ConfigError::invalid_value(key, "expected an integer")),
    };

    let layer = OptionOverrides {
        version,
        derive_from_vcs_ignore: lookup(section, VCS_IGNORE_KEYS)
            .map(|(key, value)| as_bool(key, value))
            .transpose()?,
        minimum_size: lookup(section, MINIMUM_SIZE_KEYS)
            .map(|(key, value)| as_size(key, value))
            .transpose()?,
        explicit_files: lookup(section, EXPLICIT_FILES_KEYS)
            .map(|(key, value)| as_list(key, value))
            .transpose()?,
        extension_allowlist: lookup(section, EXTENSIONS_KEYS)
            .map(|(key, value)| as_list(key, value))
            .transpose()?,
    };
    debug!(?layer, "parsed persisted repository options");
    Ok(layer)
}

/// Merge the three option layers: defaults, then persisted, then overrides
pub fn negotiate(
    defaults: &RepoOptions,
    persisted: &OptionOverrides,
    overrides: &OptionOverrides,
) -> RepoOptions {
    let mut options = defaults.clone();
    options.apply(persisted);
    options.apply(overrides);
    options
}

#[derive(Serialize)]
struct PersistedFile<'a> {
    general: &'a RepoOptions,
}

/// Render options in the persisted `options` file format
pub fn render_options(options: &RepoOptions) -> ConfigResult<String> {
    toml::to_string(&PersistedFile { general: options })
        .map_err(|e| ConfigError::SerializationError(e.to_string()))
}

/// Keys and literal values of one `[name]` section of an INI file
///
/// Keys are lowercased. `None`-valued keys are left out. Values that are
/// not a recognised literal are kept as raw strings so that typed reads
/// report them against their key.
fn parse_ini_section(content: &str, name: &str) -> Option<Table> {
    let mut section = None;
    let mut current = false;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = header.trim() == name;
            if current {
                section.get_or_insert_with(Table::new);
            }
            continue;
        }
        let Some(table) = section.as_mut().filter(|_| current) else {
            continue;
        };
        let Some((key, raw)) = line.split_once(['=', ':']) else {
            continue;
        };
        if let Some(value) = literal_value(raw.trim()) {
            table.insert(key.trim().to_lowercase(), value);
        }
    }
    section
}

fn literal_value(raw: &str) -> Option<Value> {
    match raw {
        "None" => return None,
        "True" | "true" => return Some(Value::Boolean(true)),
        "False" | "false" => return Some(Value::Boolean(false)),
        _ => {}
    }
    if let Ok(n) = raw.trim_end_matches(['L', 'l']).parse::<i64>() {
        return Some(Value::Integer(n));
    }
    let inner = raw
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .or_else(|| raw.strip_prefix('(').and_then(|r| r.strip_suffix(')')));
    let parsed = match inner {
        Some(inner) => string_items(inner).map(|items| {
            Value::Array(items.into_iter().map(Value::String).collect())
        }),
        None => string_items(raw)
            .filter(|items| items.len() == 1)
            .and_then(|mut items| items.pop())
            .map(Value::String),
    };
    Some(parsed.unwrap_or_else(|| Value::String(raw.to_string())))
}

/// Comma-separated quoted strings; `None` if anything else is present
fn string_items(text: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(quote) = chars.next() else {
            return Some(items);
        };
        if quote != '\'' && quote != '"' {
            return None;
        }
        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Some(items),
            Some(',') => {}
            Some(_) => return None,
        }
    }
}

fn lookup<'a>(section: &'a Table, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|key| section.get(*key).map(|value| (*key, value)))
}

fn as_bool(key: &str, value: &Value) -> ConfigResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| ConfigError::invalid_value(key, format!("expected a boolean, got {value}")))
}

fn as_size(key: &str, value: &Value) -> ConfigResult<u64> {
    value
        .as_integer()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| {
            ConfigError::invalid_value(key, format!("expected a non-negative integer, got {value}"))
        })
}

fn as_list(key: &str, value: &Value) -> ConfigResult<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| ConfigError::invalid_value(key, format!("expected a list, got {value}")))?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ConfigError::invalid_value(key, format!("expected a list of strings, got {item}"))
            })
        })
        .collect()
}

/// Loader for session [`Settings`]
pub struct SettingsLoader {
    validate: bool,
}

impl SettingsLoader {
    /// Create a loader that validates what it loads
    pub fn new() -> Self {
        SettingsLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        SettingsLoader { validate: false }
    }

    /// Load settings from a TOML file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Settings> {
        let path = path.as_ref();
        debug!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        info!("Loaded settings file: {}", path.display());
        self.load_from_str(&content)
    }

    /// Load settings from TOML text
    pub fn load_from_str(&self, content: &str) -> ConfigResult<Settings> {
        let settings: Settings = toml::from_str(content)?;
        if self.validate {
            settings.validate()?;
        }
        Ok(settings)
    }

    /// Load from `path` if given, otherwise start from defaults, then apply
    /// environment overrides
    pub async fn load_with_overrides(&self, path: Option<&Path>) -> ConfigResult<Settings> {
        let mut settings = match path {
            Some(path) => self.load_file(path).await?,
            None => Settings::default(),
        };
        self.apply_env_overrides(&mut settings)?;
        if self.validate {
            settings.validate()?;
        }
        Ok(settings)
    }

    /// Apply `ARTMGR_*` environment variable overrides
    pub fn apply_env_overrides(&self, settings: &mut Settings) -> ConfigResult<()> {
        apply_overrides_with(settings, |name| std::env::var(name).ok())
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply overrides read through `lookup`, keyed by environment variable name
pub fn apply_overrides_with<F>(settings: &mut Settings, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("ARTMGR_SERVER") {
        settings.server = Some(value);
    }
    if let Some(value) = lookup("ARTMGR_SHARE_DOMAIN") {
        settings.share_domain = value;
    }
    if let Some(value) = lookup("ARTMGR_SHARE_MOUNT") {
        settings.share_mount_root = Some(value.into());
    }
    if let Some(value) = lookup("ARTMGR_MIN_SIZE") {
        settings.default_options.minimum_size = value.parse().map_err(|_| {
            ConfigError::env_var_parsing_error(
                "ARTMGR_MIN_SIZE",
                &value,
                "expected a non-negative integer",
            )
        })?;
    }
    Ok(())
}
