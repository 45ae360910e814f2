use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telephony: TelephonyConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelephonyConfig {
    pub max_retry: u32,
    pub timeout_ms: u64,
    pub tone_asset: String,
    pub asset_prefix: String,
    pub welcome_pause_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NotifyConfig {
    /// Summary webhook. Chat webhook URLs embed their access token.
    pub summary_url: Option<SecretString>,
    pub callback_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub max_retry: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub summary_url: Option<String>,
    pub callback_url: Option<String>,
    pub notify_timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            max_retry: 3,
            timeout_ms: 10_000,
            tone_asset: "beep".to_string(),
            asset_prefix: "hospital_reservation".to_string(),
            welcome_pause_secs: 1,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { summary_url: None, callback_url: None, timeout_secs: 5 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telephony: TelephonyConfig::default(),
            notify: NotifyConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `IVRBOOK_*` environment
    /// variables, then explicit overrides. The result is validated.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("ivrbook.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(telephony) = patch.telephony {
            if let Some(max_retry) = telephony.max_retry {
                self.telephony.max_retry = max_retry;
            }
            if let Some(timeout_ms) = telephony.timeout_ms {
                self.telephony.timeout_ms = timeout_ms;
            }
            if let Some(tone_asset) = telephony.tone_asset {
                self.telephony.tone_asset = tone_asset;
            }
            if let Some(asset_prefix) = telephony.asset_prefix {
                self.telephony.asset_prefix = asset_prefix;
            }
            if let Some(welcome_pause_secs) = telephony.welcome_pause_secs {
                self.telephony.welcome_pause_secs = welcome_pause_secs;
            }
        }

        if let Some(notify) = patch.notify {
            if let Some(summary_url) = notify.summary_url {
                self.notify.summary_url = Some(secret_value(summary_url));
            }
            if let Some(callback_url) = notify.callback_url {
                self.notify.callback_url = Some(callback_url);
            }
            if let Some(timeout_secs) = notify.timeout_secs {
                self.notify.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("IVRBOOK_TELEPHONY_MAX_RETRY") {
            self.telephony.max_retry = parse_u32("IVRBOOK_TELEPHONY_MAX_RETRY", &value)?;
        }
        if let Some(value) = read_env("IVRBOOK_TELEPHONY_TIMEOUT_MS") {
            self.telephony.timeout_ms = parse_u64("IVRBOOK_TELEPHONY_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("IVRBOOK_TELEPHONY_TONE_ASSET") {
            self.telephony.tone_asset = value;
        }
        if let Some(value) = read_env("IVRBOOK_TELEPHONY_ASSET_PREFIX") {
            self.telephony.asset_prefix = value;
        }
        if let Some(value) = read_env("IVRBOOK_TELEPHONY_WELCOME_PAUSE_SECS") {
            self.telephony.welcome_pause_secs =
                parse_u64("IVRBOOK_TELEPHONY_WELCOME_PAUSE_SECS", &value)?;
        }

        if let Some(value) = read_env("IVRBOOK_NOTIFY_SUMMARY_URL") {
            self.notify.summary_url = Some(secret_value(value));
        }
        if let Some(value) = read_env("IVRBOOK_NOTIFY_CALLBACK_URL") {
            self.notify.callback_url = Some(value);
        }
        if let Some(value) = read_env("IVRBOOK_NOTIFY_TIMEOUT_SECS") {
            self.notify.timeout_secs = parse_u64("IVRBOOK_NOTIFY_TIMEOUT_SECS", &value)?;
        }

        let log_level = read_env("IVRBOOK_LOGGING_LEVEL").or_else(|| read_env("IVRBOOK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("IVRBOOK_LOGGING_FORMAT").or_else(|| read_env("IVRBOOK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(max_retry) = overrides.max_retry {
            self.telephony.max_retry = max_retry;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.telephony.timeout_ms = timeout_ms;
        }
        if let Some(summary_url) = overrides.summary_url {
            self.notify.summary_url = Some(secret_value(summary_url));
        }
        if let Some(callback_url) = overrides.callback_url {
            self.notify.callback_url = Some(callback_url);
        }
        if let Some(timeout_secs) = overrides.notify_timeout_secs {
            self.notify.timeout_secs = timeout_secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_telephony(&self.telephony)?;
        validate_notify(&self.notify)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("ivrbook.toml"), PathBuf::from("config/ivrbook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_telephony(telephony: &TelephonyConfig) -> Result<(), ConfigError> {
    if telephony.max_retry == 0 || telephony.max_retry > 9 {
        return Err(ConfigError::Validation(
            "telephony.max_retry must be in range 1..=9".to_string(),
        ));
    }

    if telephony.timeout_ms == 0 || telephony.timeout_ms > 60_000 {
        return Err(ConfigError::Validation(
            "telephony.timeout_ms must be in range 1..=60000".to_string(),
        ));
    }

    if telephony.tone_asset.trim().is_empty() {
        return Err(ConfigError::Validation("telephony.tone_asset must not be empty".to_string()));
    }

    if telephony.welcome_pause_secs > 30 {
        return Err(ConfigError::Validation(
            "telephony.welcome_pause_secs must be at most 30".to_string(),
        ));
    }

    Ok(())
}

fn validate_notify(notify: &NotifyConfig) -> Result<(), ConfigError> {
    if notify.timeout_secs == 0 || notify.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "notify.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    if let Some(summary_url) = &notify.summary_url {
        if !is_http_url(summary_url.expose_secret()) {
            return Err(ConfigError::Validation(
                "notify.summary_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if let Some(callback_url) = &notify.callback_url {
        if !is_http_url(callback_url) {
            return Err(ConfigError::Validation(
                "notify.callback_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    telephony: Option<TelephonyPatch>,
    notify: Option<NotifyPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TelephonyPatch {
    max_retry: Option<u32>,
    timeout_ms: Option<u64>,
    tone_asset: Option<String>,
    asset_prefix: Option<String>,
    welcome_pause_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NotifyPatch {
    summary_url: Option<String>,
    callback_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
