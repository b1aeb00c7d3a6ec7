//!
//! This module defines configuration structures, loading logic, and provenance tracking for mdwrap.
//! Configuration comes from TOML files (user-level and project-level) and command-line overrides,
//! merged by precedence. The wrap column is exposed to the reflow commands through [`WrapColumnSource`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Supplies the target wrap column
pub trait WrapColumnSource {
    /// The configured wrap column, or `None` when nothing is configured
    fn wrap_column(&self) -> Option<usize>;
}

impl WrapColumnSource for usize {
    fn wrap_column(&self) -> Option<usize> {
        Some(*self).filter(|c| *c > 0)
    }
}

impl WrapColumnSource for Option<usize> {
    fn wrap_column(&self) -> Option<usize> {
        self.filter(|c| *c > 0)
    }
}

/// Normalizes configuration keys to lowercase kebab-case.
pub fn normalize_key(key: &str) -> String {
    key.replace('_', "-").to_ascii_lowercase()
}

/// Represents the complete configuration loaded from mdwrap.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Global configuration options
    #[serde(default)]
    pub global: GlobalConfig,
}

impl WrapColumnSource for Config {
    fn wrap_column(&self) -> Option<usize> {
        self.global.wrap_column()
    }
}

/// Global configuration options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Column rulers, as in an editor. The first ruler is the wrap column.
    pub rulers: Vec<usize>,

    /// Explicit wrap column, takes precedence over `rulers`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_column: Option<usize>,

    /// Files to include (glob patterns)
    pub include: Vec<String>,

    /// Files to exclude (glob patterns)
    pub exclude: Vec<String>,

    /// Respect .gitignore files when scanning directories
    pub respect_gitignore: bool,

    /// Honour `<!-- mdwrap-... -->` directive comments
    pub inline_directives: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            rulers: Vec::new(),
            wrap_column: None,
            include: Vec::new(),
            exclude: Vec::new(),
            respect_gitignore: true,
            inline_directives: true,
        }
    }
}

impl GlobalConfig {
    pub fn wrap_column(&self) -> Option<usize> {
        self.wrap_column.or_else(|| self.rulers.first().copied()).filter(|c| *c > 0)
    }
}

/// Keys accepted in the [global] section
const GLOBAL_KEYS: &[&str] = &[
    "rulers",
    "wrap-column",
    "include",
    "exclude",
    "respect-gitignore",
    "inline-directives",
];

/// Project configuration file names, in precedence order
const CONFIG_FILES: &[&str] = &[".mdwrap.toml", "mdwrap.toml", ".config/mdwrap.toml"];

/// Create a default configuration file at the specified path
pub fn create_default_config(path: &str) -> Result<(), ConfigError> {
    if Path::new(path).exists() {
        return Err(ConfigError::FileExists { path: path.to_string() });
    }

    let default_config = r#"# mdwrap configuration file

[global]
# Column rulers; the first one is the wrap column
rulers = [80]

# Explicit wrap column (overrides rulers)
# wrap-column = 100

# List of file/directory patterns to include (if provided, only these are wrapped)
# include = [
#    "docs/*.md",
#    "README.md"
# ]

# List of file/directory patterns to exclude
exclude = [
    ".git",
    ".github",
    "node_modules",
    "vendor",
    "CHANGELOG.md",
]

# Respect .gitignore files when scanning directories (default: true)
respect-gitignore = true

# Honour <!-- mdwrap-disable --> style comments (default: true)
inline-directives = true
"#;

    fs::write(path, default_config).map_err(|err| ConfigError::IoError {
        source: err,
        path: path.to_string(),
    })
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file at {path}: {source}")]
    IoError { source: io::Error, path: String },

    /// Failed to parse the configuration content
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// A value has the right type but is not acceptable
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration file already exists
    #[error("Configuration file already exists at {path}")]
    FileExists { path: String },
}

/// Where a configuration value came from, in increasing precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigSource {
    /// Built-in default configuration
    Default,
    /// User-level configuration from ~/.config/mdwrap/mdwrap.toml
    UserConfig,
    /// Project-level configuration from .mdwrap.toml or mdwrap.toml
    ProjectConfig,
    /// Command-line flags (highest precedence)
    Cli,
}

impl ConfigSource {
    fn precedence(self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::UserConfig => 1,
            ConfigSource::ProjectConfig => 2,
            ConfigSource::Cli => 3,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::UserConfig => write!(f, "user config"),
            ConfigSource::ProjectConfig => write!(f, "project config"),
            ConfigSource::Cli => write!(f, "CLI"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigOverride<T> {
    pub value: T,
    pub source: ConfigSource,
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SourcedValue<T> {
    pub value: T,
    pub source: ConfigSource,
    pub overrides: Vec<ConfigOverride<T>>,
}

impl<T: Clone> SourcedValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self {
            value: value.clone(),
            source,
            overrides: vec![ConfigOverride {
                value,
                source,
                file: None,
            }],
        }
    }

    /// Merges a new override into this SourcedValue based on source precedence.
    /// If the new source has higher or equal precedence, the value and source are updated,
    /// and the new override is added to the history.
    pub fn merge_override(&mut self, new_value: T, new_source: ConfigSource, new_file: Option<String>) {
        if new_source.precedence() >= self.source.precedence() {
            self.push_override(new_value, new_source, new_file);
        }
    }

    pub fn push_override(&mut self, value: T, source: ConfigSource, file: Option<String>) {
        self.value = value.clone();
        self.source = source;
        self.overrides.push(ConfigOverride { value, source, file });
    }

    /// File the current value was loaded from, if any
    pub fn file(&self) -> Option<&str> {
        self.overrides.last().and_then(|o| o.file.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct SourcedGlobalConfig {
    pub rulers: SourcedValue<Vec<usize>>,
    pub wrap_column: SourcedValue<Option<usize>>,
    pub include: SourcedValue<Vec<String>>,
    pub exclude: SourcedValue<Vec<String>>,
    pub respect_gitignore: SourcedValue<bool>,
    pub inline_directives: SourcedValue<bool>,
}

impl Default for SourcedGlobalConfig {
    fn default() -> Self {
        let defaults = GlobalConfig::default();
        SourcedGlobalConfig {
            rulers: SourcedValue::new(defaults.rulers, ConfigSource::Default),
            wrap_column: SourcedValue::new(defaults.wrap_column, ConfigSource::Default),
            include: SourcedValue::new(defaults.include, ConfigSource::Default),
            exclude: SourcedValue::new(defaults.exclude, ConfigSource::Default),
            respect_gitignore: SourcedValue::new(defaults.respect_gitignore, ConfigSource::Default),
            inline_directives: SourcedValue::new(defaults.inline_directives, ConfigSource::Default),
        }
    }
}

/// Configuration loaded from a single file, with provenance.
/// Used as an intermediate step before merging into the final SourcedConfig.
#[derive(Debug, Clone, Default)]
pub struct SourcedConfigFragment {
    pub global: SourcedGlobalConfig,
    pub unknown_keys: Vec<(String, String, Option<String>)>, // (section, key, file_path)
}

/// Settings given on the command line, applied with the highest precedence
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub wrap_column: Option<usize>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub respect_gitignore: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SourcedConfig {
    pub global: SourcedGlobalConfig,
    pub loaded_files: Vec<String>,
    pub unknown_keys: Vec<(String, String, Option<String>)>, // (section, key, file_path)
    /// Project root directory (parent of config file), used for resolving relative paths
    pub project_root: Option<PathBuf>,
}

impl SourcedConfig {
    /// Merges a SourcedConfigFragment into this SourcedConfig.
    /// Uses source precedence to determine which values take effect.
    fn merge(&mut self, fragment: SourcedConfigFragment) {
        let g = fragment.global;
        self.global
            .rulers
            .merge_override(g.rulers.value.clone(), g.rulers.source, g.rulers.file().map(str::to_string));
        self.global.wrap_column.merge_override(
            g.wrap_column.value,
            g.wrap_column.source,
            g.wrap_column.file().map(str::to_string),
        );
        self.global
            .include
            .merge_override(g.include.value.clone(), g.include.source, g.include.file().map(str::to_string));
        self.global
            .exclude
            .merge_override(g.exclude.value.clone(), g.exclude.source, g.exclude.file().map(str::to_string));
        self.global.respect_gitignore.merge_override(
            g.respect_gitignore.value,
            g.respect_gitignore.source,
            g.respect_gitignore.file().map(str::to_string),
        );
        self.global.inline_directives.merge_override(
            g.inline_directives.value,
            g.inline_directives.source,
            g.inline_directives.file().map(str::to_string),
        );
        self.unknown_keys.extend(fragment.unknown_keys);
    }

    fn load_file(&mut self, path: &Path, source: ConfigSource) -> Result<(), ConfigError> {
        let path_str = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            source: e,
            path: path_str.clone(),
        })?;
        let fragment = parse_mdwrap_toml(&content, &path_str, source)?;
        self.merge(fragment);
        self.loaded_files.push(path_str);
        Ok(())
    }

    /// Load and merge configurations from files and CLI overrides.
    pub fn load(config_path: Option<&str>, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        Self::load_with_discovery(config_path, cli_overrides, false)
    }

    /// Load and merge configurations from files and CLI overrides.
    /// If skip_auto_discovery is true, only explicit config paths are loaded.
    pub fn load_with_discovery(
        config_path: Option<&str>,
        cli_overrides: Option<&CliOverrides>,
        skip_auto_discovery: bool,
    ) -> Result<Self, ConfigError> {
        Self::load_with_discovery_impl(config_path, cli_overrides, skip_auto_discovery, None)
    }

    #[doc(hidden)]
    pub fn load_with_discovery_impl(
        config_path: Option<&str>,
        cli_overrides: Option<&CliOverrides>,
        skip_auto_discovery: bool,
        user_config_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        log::debug!("[mdwrap-config] Current working directory: {:?}", std::env::current_dir());
        let mut sourced_config = SourcedConfig::default();

        // 1. User configuration is the base layer project configs build upon
        if !skip_auto_discovery {
            let user_config_path = match user_config_dir {
                Some(dir) => Self::user_configuration_path_impl(dir),
                None => Self::user_configuration_path(),
            };
            if let Some(user_config_path) = user_config_path {
                log::debug!(
                    "[mdwrap-config] Loading user configuration file: {}",
                    user_config_path.display()
                );
                sourced_config.load_file(&user_config_path, ConfigSource::UserConfig)?;
            } else {
                log::debug!("[mdwrap-config] No user configuration file found");
            }
        }

        // 2. Explicit config path overrides user config
        if let Some(path) = config_path {
            log::debug!("[mdwrap-config] Explicit config_path provided: {path}");
            let path_obj = Path::new(path);
            if let Some(config_parent) = path_obj.parent() {
                sourced_config.project_root = Some(Self::find_project_root_from(config_parent));
            }
            sourced_config.load_file(path_obj, ConfigSource::ProjectConfig)?;
        } else if !skip_auto_discovery {
            // 3. Auto-discovery of project config
            if let Some((config_file, project_root)) = Self::discover_config_upward() {
                log::debug!("[mdwrap-config] Loading discovered config file: {}", config_file.display());
                log::debug!("[mdwrap-config] Project root: {}", project_root.display());
                sourced_config.project_root = Some(project_root);
                sourced_config.load_file(&config_file, ConfigSource::ProjectConfig)?;
            } else {
                log::debug!("[mdwrap-config] No configuration file found via upward traversal");
            }
        } else {
            log::debug!("[mdwrap-config] Skipping auto-discovery due to --no-config flag");
        }

        // 4. CLI overrides (highest precedence)
        if let Some(cli) = cli_overrides {
            if let Some(column) = cli.wrap_column {
                if column == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "wrap-column".to_string(),
                        message: "must be a positive integer".to_string(),
                    });
                }
                sourced_config
                    .global
                    .wrap_column
                    .merge_override(Some(column), ConfigSource::Cli, None);
            }
            if let Some(include) = &cli.include {
                sourced_config
                    .global
                    .include
                    .merge_override(include.clone(), ConfigSource::Cli, None);
            }
            if let Some(exclude) = &cli.exclude {
                sourced_config
                    .global
                    .exclude
                    .merge_override(exclude.clone(), ConfigSource::Cli, None);
            }
            if let Some(respect_gitignore) = cli.respect_gitignore {
                sourced_config
                    .global
                    .respect_gitignore
                    .merge_override(respect_gitignore, ConfigSource::Cli, None);
            }
        }

        Ok(sourced_config)
    }

    /// Finds project root by walking up from start_dir looking for .git directory.
    /// Falls back to start_dir if no .git found.
    fn find_project_root_from(start_dir: &Path) -> PathBuf {
        let mut current = start_dir.to_path_buf();
        const MAX_DEPTH: usize = 100;

        for _ in 0..MAX_DEPTH {
            if current.join(".git").exists() {
                log::debug!("[mdwrap-config] Found .git at: {}", current.display());
                return current;
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        log::debug!(
            "[mdwrap-config] No .git found, using config location as project root: {}",
            start_dir.display()
        );
        start_dir.to_path_buf()
    }

    /// Discover configuration file by traversing up the directory tree, stopping at .git.
    /// Returns: (config_file_path, project_root_path)
    fn discover_config_upward() -> Option<(PathBuf, PathBuf)> {
        const MAX_DEPTH: usize = 100;

        let mut current_dir = match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                log::debug!("[mdwrap-config] Failed to get current directory: {e}");
                return None;
            }
        };

        for _ in 0..MAX_DEPTH {
            log::debug!("[mdwrap-config] Searching for config in: {}", current_dir.display());

            for config_name in CONFIG_FILES {
                let config_path = current_dir.join(config_name);
                if config_path.is_file() {
                    log::debug!("[mdwrap-config] Found config file: {}", config_path.display());
                    let project_root = Self::find_project_root_from(&current_dir);
                    return Some((config_path, project_root));
                }
            }

            if current_dir.join(".git").exists() {
                log::debug!("[mdwrap-config] Stopping at .git directory");
                break;
            }

            if !current_dir.pop() {
                log::debug!("[mdwrap-config] Reached filesystem root");
                break;
            }
        }

        None
    }

    /// Internal implementation that accepts config directory for testing
    fn user_configuration_path_impl(config_dir: &Path) -> Option<PathBuf> {
        let config_dir = config_dir.join("mdwrap");
        log::debug!(
            "[mdwrap-config] Checking for user configuration in: {}",
            config_dir.display()
        );

        [".mdwrap.toml", "mdwrap.toml"]
            .iter()
            .map(|filename| config_dir.join(filename))
            .find(|path| path.is_file())
    }

    /// Discover user-level configuration file from platform-specific config directory.
    fn user_configuration_path() -> Option<PathBuf> {
        use etcetera::{BaseStrategy, choose_base_strategy};

        match choose_base_strategy() {
            Ok(strategy) => Self::user_configuration_path_impl(&strategy.config_dir()),
            Err(e) => {
                log::debug!("[mdwrap-config] Failed to determine user config directory: {e}");
                None
            }
        }
    }
}

impl From<SourcedConfig> for Config {
    fn from(sourced: SourcedConfig) -> Self {
        Config {
            global: GlobalConfig {
                rulers: sourced.global.rulers.value,
                wrap_column: sourced.global.wrap_column.value,
                include: sourced.global.include.value,
                exclude: sourced.global.exclude.value,
                respect_gitignore: sourced.global.respect_gitignore.value,
                inline_directives: sourced.global.inline_directives.value,
            },
        }
    }
}

impl WrapColumnSource for SourcedConfig {
    fn wrap_column(&self) -> Option<usize> {
        self.global
            .wrap_column
            .value
            .or_else(|| self.global.rulers.value.first().copied())
            .filter(|c| *c > 0)
    }
}

fn toml_type_name(val: &toml::Value) -> &'static str {
    match val {
        toml::Value::String(_) => "string",
        toml::Value::Integer(_) => "integer",
        toml::Value::Float(_) => "float",
        toml::Value::Boolean(_) => "boolean",
        toml::Value::Array(_) => "array",
        toml::Value::Table(_) => "table",
        toml::Value::Datetime(_) => "datetime",
    }
}

fn type_error(key: &str, path: &str, expected: &str, value: &toml::Value) -> ConfigError {
    ConfigError::ParseError(format!(
        "{path}: Expected {expected} for global key '{key}', found {}",
        toml_type_name(value)
    ))
}

fn parse_column(key: &str, path: &str, value: &toml::Value) -> Result<usize, ConfigError> {
    let Some(raw) = value.as_integer() else {
        return Err(type_error(key, path, "integer", value));
    };
    match usize::try_from(raw) {
        Ok(column) if column > 0 => Ok(column),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{path}: must be a positive integer, found {raw}"),
        }),
    }
}

fn parse_string_array(key: &str, path: &str, value: &toml::Value) -> Result<Vec<String>, ConfigError> {
    let Some(items) = value.as_array() else {
        return Err(type_error(key, path, "array of strings", value));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| type_error(key, path, "array of strings", value))
        })
        .collect()
}

fn parse_bool(key: &str, path: &str, value: &toml::Value) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| type_error(key, path, "boolean", value))
}

/// Parses an mdwrap.toml document into a fragment tagged with `source`
fn parse_mdwrap_toml(content: &str, path: &str, source: ConfigSource) -> Result<SourcedConfigFragment, ConfigError> {
    let doc: toml::Table =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("{path}: Failed to parse TOML: {e}")))?;
    let mut fragment = SourcedConfigFragment::default();
    let file = Some(path.to_string());

    for (section, item) in &doc {
        if section != "global" {
            fragment
                .unknown_keys
                .push(("root".to_string(), section.clone(), file.clone()));
            continue;
        }

        let Some(global_table) = item.as_table() else {
            return Err(type_error(section, path, "table", item));
        };

        for (key, value) in global_table {
            let norm_key = normalize_key(key);
            match norm_key.as_str() {
                "rulers" => {
                    let Some(items) = value.as_array() else {
                        return Err(type_error(key, path, "array of integers", value));
                    };
                    let rulers = items
                        .iter()
                        .map(|item| parse_column(key, path, item))
                        .collect::<Result<Vec<_>, _>>()?;
                    fragment.global.rulers.push_override(rulers, source, file.clone());
                }
                "wrap-column" => {
                    let column = parse_column(key, path, value)?;
                    fragment
                        .global
                        .wrap_column
                        .push_override(Some(column), source, file.clone());
                }
                "include" => {
                    let include = parse_string_array(key, path, value)?;
                    fragment.global.include.push_override(include, source, file.clone());
                }
                "exclude" => {
                    let exclude = parse_string_array(key, path, value)?;
                    fragment.global.exclude.push_override(exclude, source, file.clone());
                }
                "respect-gitignore" => {
                    let respect = parse_bool(key, path, value)?;
                    fragment
                        .global
                        .respect_gitignore
                        .push_override(respect, source, file.clone());
                }
                "inline-directives" => {
                    let enabled = parse_bool(key, path, value)?;
                    fragment
                        .global
                        .inline_directives
                        .push_override(enabled, source, file.clone());
                }
                _ => {
                    log::debug!("[mdwrap-config] Unknown global key '{key}' in {path}");
                    fragment
                        .unknown_keys
                        .push(("[global]".to_string(), key.clone(), file.clone()));
                }
            }
        }
    }

    Ok(fragment)
}

/// Represents a config validation warning
#[derive(Debug, Clone)]
pub struct ConfigValidationWarning {
    pub message: String,
    pub key: Option<String>,
}

/// Validate a loaded config, reporting unknown keys with a suggestion when one is close
pub fn validate_config_sourced(sourced: &SourcedConfig) -> Vec<ConfigValidationWarning> {
    let valid_keys: Vec<String> = GLOBAL_KEYS.iter().map(|k| k.to_string()).collect();

    sourced
        .unknown_keys
        .iter()
        .map(|(section, key, file)| {
            let location = file.as_deref().map(|f| format!(" in {f}")).unwrap_or_default();
            let message = if section == "root" {
                format!("Unknown section [{key}]{location}")
            } else if let Some(suggestion) = suggest_similar_key(&normalize_key(key), &valid_keys) {
                format!("Unknown key '{key}' in {section}{location} (did you mean '{suggestion}'?)")
            } else {
                format!("Unknown key '{key}' in {section}{location}")
            };
            ConfigValidationWarning {
                message,
                key: Some(key.clone()),
            }
        })
        .collect()
}

/// Calculate Levenshtein distance between two strings (simple implementation)
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut prev_row: Vec<usize> = (0..=len2).collect();
    let mut curr_row = vec![0; len2 + 1];

    for i in 1..=len1 {
        curr_row[0] = i;
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            curr_row[j] = (prev_row[j] + 1)          // deletion
                .min(curr_row[j - 1] + 1)            // insertion
                .min(prev_row[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len2]
}

/// Suggest a similar key from a list of valid keys using fuzzy matching
fn suggest_similar_key(unknown: &str, valid_keys: &[String]) -> Option<String> {
    let unknown_lower = unknown.to_lowercase();
    let max_distance = 2.max(unknown.len() / 3); // Allow up to 2 edits or 30% of string length

    valid_keys
        .iter()
        .map(|valid| (valid, levenshtein_distance(&unknown_lower, &valid.to_lowercase())))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by_key(|(_, distance)| *distance)
        .map(|(key, _)| key.clone())
}
