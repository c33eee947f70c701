//! Configuration for fsgate.
//!
//! Resolution order, later layers winning:
//! 1. built-in defaults
//! 2. an optional TOML file (`--config` or `FSGATE_CONFIG`)
//! 3. `.env` and process environment (`FSGATE_*`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::observability::LogFormat;
use crate::policy::{AccessPolicy, DenialDisclosure, PolicyMode};
use crate::tools::DEFAULT_CALLER;

/// Allowed directories used when nothing else is configured.
pub const DEFAULT_ALLOWED_DIRECTORIES: &[&str] = &["/app/demo/user_files/", "/app/demo/public/"];

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: PolicyConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// `path` wins over `FSGATE_CONFIG`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => optional_env("FSGATE_CONFIG")?.map(PathBuf::from),
        };

        let mut config = match path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw).map_err(|e| match e {
            ConfigError::ParseError(msg) => {
                ConfigError::ParseError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Overlay `FSGATE_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.policy.apply_env()?;
        self.audit.apply_env()?;
        self.logging.apply_env()?;
        Ok(())
    }

    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.allowed_directories.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "FSGATE_ALLOWED_DIRS".to_string(),
                hint: "Configure at least one allowed directory.".to_string(),
            });
        }
        if let Some(dir) = self
            .policy
            .allowed_directories
            .iter()
            .find(|d| !d.starts_with('/'))
        {
            return Err(ConfigError::InvalidValue {
                key: "FSGATE_ALLOWED_DIRS".to_string(),
                message: format!("'{dir}' is not an absolute path"),
            });
        }
        if self.audit.caller.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "FSGATE_CALLER".to_string(),
                message: "caller identity must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Access policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Directory prefixes every permitted path must start with.
    pub allowed_directories: Vec<String>,
    pub mode: PolicyMode,
    /// Overrides the mode's allowlist enforcement.
    pub enforce_allowlist: Option<bool>,
    /// Overrides the mode's description sanitizing.
    pub sanitize_descriptions: Option<bool>,
    pub disclosure: DenialDisclosure,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_directories: DEFAULT_ALLOWED_DIRECTORIES
                .iter()
                .map(|d| d.to_string())
                .collect(),
            mode: PolicyMode::default(),
            enforce_allowlist: None,
            sanitize_descriptions: None,
            disclosure: DenialDisclosure::default(),
        }
    }
}

impl PolicyConfig {
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(dirs) = optional_env("FSGATE_ALLOWED_DIRS")? {
            self.allowed_directories = dirs
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
        }
        self.mode = parse_optional_env("FSGATE_POLICY_MODE", self.mode)?;
        if let Some(enforce) = parse_bool_env("FSGATE_ENFORCE_ALLOWLIST")? {
            self.enforce_allowlist = Some(enforce);
        }
        if let Some(sanitize) = parse_bool_env("FSGATE_SANITIZE_DESCRIPTIONS")? {
            self.sanitize_descriptions = Some(sanitize);
        }
        if let Some(disclose) = parse_bool_env("FSGATE_DISCLOSE_ALLOWLIST")? {
            self.disclosure = if disclose {
                DenialDisclosure::Full
            } else {
                DenialDisclosure::Generic
            };
        }
        Ok(())
    }

    pub fn enforces_allowlist(&self) -> bool {
        self.enforce_allowlist
            .unwrap_or_else(|| self.mode.enforces_allowlist())
    }

    pub fn sanitizes_descriptions(&self) -> bool {
        self.sanitize_descriptions
            .unwrap_or_else(|| self.mode.sanitizes_descriptions())
    }

    /// Build the runtime policy.
    pub fn build(&self) -> AccessPolicy {
        AccessPolicy::new(&self.allowed_directories)
            .with_enforcement(self.enforces_allowlist())
            .with_disclosure(self.disclosure)
    }
}

/// Audit trail settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// JSONL file to append records to, in addition to the tracing sink.
    pub log_path: Option<PathBuf>,
    /// Caller identity recorded when the transport supplies none.
    pub caller: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            caller: DEFAULT_CALLER.to_string(),
        }
    }
}

impl AuditConfig {
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = optional_env("FSGATE_AUDIT_LOG")? {
            self.log_path = Some(PathBuf::from(path));
        }
        if let Some(caller) = optional_env("FSGATE_CALLER")? {
            self.caller = caller;
        }
        Ok(())
    }
}

/// Diagnostic log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(level) = optional_env("FSGATE_LOG_LEVEL")? {
            self.level = level;
        }
        self.format = parse_optional_env("FSGATE_LOG_FORMAT", self.format)?;
        Ok(())
    }
}

pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}

fn parse_bool_env(key: &str) -> Result<Option<bool>, ConfigError> {
    optional_env(key)?
        .map(|s| s.trim().to_ascii_lowercase().parse::<bool>())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be 'true' or 'false': {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global, so serialize tests that mutate them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const FSGATE_VARS: &[&str] = &[
        "FSGATE_CONFIG",
        "FSGATE_ALLOWED_DIRS",
        "FSGATE_POLICY_MODE",
        "FSGATE_ENFORCE_ALLOWLIST",
        "FSGATE_SANITIZE_DESCRIPTIONS",
        "FSGATE_DISCLOSE_ALLOWLIST",
        "FSGATE_AUDIT_LOG",
        "FSGATE_CALLER",
        "FSGATE_LOG_LEVEL",
        "FSGATE_LOG_FORMAT",
    ];

    fn clear_env() {
        for key in FSGATE_VARS {
            unsafe { std::env::remove_var(key) };
        }
    }

    // --- optional_env tests ---

    #[test]
    fn optional_env_returns_none_for_missing_var() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::remove_var("_TEST_FSGATE_MISSING_42") };
        assert!(optional_env("_TEST_FSGATE_MISSING_42").unwrap().is_none());
    }

    #[test]
    fn optional_env_returns_none_for_empty_string() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::set_var("_TEST_FSGATE_EMPTY_42", "") };
        assert!(optional_env("_TEST_FSGATE_EMPTY_42").unwrap().is_none());
        unsafe { std::env::remove_var("_TEST_FSGATE_EMPTY_42") };
    }

    #[test]
    fn parse_optional_env_returns_error_for_invalid_value() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::set_var("_TEST_FSGATE_MODE_42", "lenient") };
        let result = parse_optional_env("_TEST_FSGATE_MODE_42", PolicyMode::Secure);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        unsafe { std::env::remove_var("_TEST_FSGATE_MODE_42") };
    }

    // --- Config tests ---

    #[test]
    fn defaults_are_secure() {
        let config = Config::default();
        assert_eq!(
            config.policy.allowed_directories,
            ["/app/demo/user_files/", "/app/demo/public/"]
        );
        assert!(config.policy.enforces_allowlist());
        assert!(config.policy.sanitizes_descriptions());
        assert_eq!(config.policy.disclosure, DenialDisclosure::Full);
        assert_eq!(config.audit.caller, "local");
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn toml_sections_are_optional() {
        let config = Config::from_toml(
            r#"
            [policy]
            allowed_directories = ["/srv/share"]
            mode = "vulnerable"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.policy.allowed_directories, ["/srv/share"]);
        assert_eq!(config.policy.mode, PolicyMode::Permissive);
        assert!(!config.policy.enforces_allowlist());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.audit, AuditConfig::default());
    }

    #[test]
    fn toml_rejects_unknown_mode() {
        let err = Config::from_toml("[policy]\nmode = \"open\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn overrides_beat_mode() {
        let policy = PolicyConfig {
            mode: PolicyMode::Permissive,
            sanitize_descriptions: Some(true),
            ..PolicyConfig::default()
        };
        assert!(!policy.enforces_allowlist());
        assert!(policy.sanitizes_descriptions());
    }

    #[test]
    fn built_policy_follows_config() {
        let policy = PolicyConfig {
            allowed_directories: vec!["/srv/a".into()],
            disclosure: DenialDisclosure::Generic,
            ..PolicyConfig::default()
        }
        .build();
        assert_eq!(policy.allowed_directories(), ["/srv/a/"]);
        assert_eq!(policy.disclosure(), DenialDisclosure::Generic);
        assert!(policy.enforces_allowlist());
    }

    #[test]
    fn env_overrides_file() {
        let _lock = ENV_LOCK.lock();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fsgate.toml");
        std::fs::write(
            &file,
            "[policy]\nallowed_directories = [\"/srv/share\"]\n[audit]\ncaller = \"file\"\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var("FSGATE_ALLOWED_DIRS", "/data/a, /data/b/");
            std::env::set_var("FSGATE_DISCLOSE_ALLOWLIST", "false");
            std::env::set_var("FSGATE_POLICY_MODE", "permissive");
            std::env::set_var("FSGATE_AUDIT_LOG", "/var/log/fsgate/audit.jsonl");
        }

        let config = Config::load(Some(file.as_path())).unwrap();
        clear_env();

        assert_eq!(config.policy.allowed_directories, ["/data/a", "/data/b/"]);
        assert_eq!(config.policy.disclosure, DenialDisclosure::Generic);
        assert_eq!(config.policy.mode, PolicyMode::Permissive);
        assert_eq!(config.audit.caller, "file");
        assert_eq!(
            config.audit.log_path.as_deref(),
            Some(Path::new("/var/log/fsgate/audit.jsonl"))
        );
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let _lock = ENV_LOCK.lock();
        clear_env();
        unsafe { std::env::set_var("FSGATE_ENFORCE_ALLOWLIST", "sometimes") };

        let err = Config::load(None).unwrap_err();
        clear_env();

        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "FSGATE_ENFORCE_ALLOWLIST"
        ));
    }

    #[test]
    fn relative_directory_fails_validation() {
        let mut config = Config::default();
        config.policy.allowed_directories = vec!["public/".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not an absolute path"));
    }

    #[test]
    fn empty_allowlist_fails_validation() {
        let mut config = Config::default();
        config.policy.allowed_directories.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::from_file(Path::new("/nonexistent/fsgate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
