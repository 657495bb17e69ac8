use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main cc-hooks configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub hooks: HooksConfig,
    pub guard: GuardConfig,
    pub formatter: FormatterConfig,
    pub session: SessionConfig,
}

/// Log verbosity written to the log file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Which hook handlers are registered
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HooksConfig {
    pub guard_enabled: bool,
    pub formatter_enabled: bool,
    pub session_enabled: bool,
}

/// A user-supplied rule appended after the built-in tables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Extra blocking rules (matched case-insensitively)
    pub extra_blocked: Vec<RuleSpec>,
    /// Extra suggestion rules (matched case-sensitively)
    pub extra_suggestions: Vec<RuleSpec>,
}

/// Built-in formatters that run in-process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinFormatter {
    /// Collapse runs of three or more newlines to a single blank line
    CollapseBlankLines,
}

/// What to do with a file of a given extension
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FormatterDirective {
    /// External command; the file path is appended as the last argument
    Command(Vec<String>),
    Builtin(BuiltinFormatter),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Seconds to wait for an external formatter before abandoning it
    pub timeout_secs: u64,
    /// Extension (without the dot) to directive, in lookup order
    pub extensions: IndexMap<String, FormatterDirective>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Project context file, relative to the session working directory
    pub context_file: PathBuf,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            guard_enabled: true,
            formatter_enabled: true,
            session_enabled: true,
        }
    }
}

fn command(args: &[&str]) -> FormatterDirective {
    FormatterDirective::Command(args.iter().map(|a| a.to_string()).collect())
}

impl Default for FormatterConfig {
    fn default() -> Self {
        let prettier = command(&["npx", "prettier", "--write"]);

        Self {
            timeout_secs: 30,
            extensions: IndexMap::from([
                ("py".to_string(), command(&["python3", "-m", "black", "--quiet"])),
                ("js".to_string(), prettier.clone()),
                ("ts".to_string(), prettier.clone()),
                ("json".to_string(), prettier),
                (
                    "md".to_string(),
                    FormatterDirective::Builtin(BuiltinFormatter::CollapseBlankLines),
                ),
            ]),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_file: PathBuf::from(".claude").join("CONTEXT.md"),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit config path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        if let Ok(env_path) = std::env::var("CC_HOOKS_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from CC_HOOKS_CONFIG: {}", e);
                    }
                }
            }
        }

        let path = Self::hooks_dir().join("cc-hooks.yaml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        // Try ./cc-hooks.yaml (for development)
        let local_config = PathBuf::from("cc-hooks.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        // An empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Directory holding the user config (`$CC_HOOKS_DIR` or `<config_dir>/cc-hooks`)
    pub fn hooks_dir() -> PathBuf {
        std::env::var("CC_HOOKS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("cc-hooks"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}
