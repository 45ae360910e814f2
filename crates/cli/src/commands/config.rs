use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ivrbook_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field<'a> {
    key: &'a str,
    env: &'a [&'a str],
    overridden: bool,
    value: String,
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let telephony = &config.telephony;
    let notify = &config.notify;
    let overrides = &options.overrides;
    let fields = [
        Field {
            key: "telephony.max_retry",
            env: &["IVRBOOK_TELEPHONY_MAX_RETRY"],
            overridden: overrides.max_retry.is_some(),
            value: telephony.max_retry.to_string(),
        },
        Field {
            key: "telephony.timeout_ms",
            env: &["IVRBOOK_TELEPHONY_TIMEOUT_MS"],
            overridden: overrides.timeout_ms.is_some(),
            value: telephony.timeout_ms.to_string(),
        },
        Field {
            key: "telephony.tone_asset",
            env: &["IVRBOOK_TELEPHONY_TONE_ASSET"],
            overridden: false,
            value: telephony.tone_asset.clone(),
        },
        Field {
            key: "telephony.asset_prefix",
            env: &["IVRBOOK_TELEPHONY_ASSET_PREFIX"],
            overridden: false,
            value: telephony.asset_prefix.clone(),
        },
        Field {
            key: "telephony.welcome_pause_secs",
            env: &["IVRBOOK_TELEPHONY_WELCOME_PAUSE_SECS"],
            overridden: false,
            value: telephony.welcome_pause_secs.to_string(),
        },
        Field {
            key: "notify.summary_url",
            env: &["IVRBOOK_NOTIFY_SUMMARY_URL"],
            overridden: overrides.summary_url.is_some(),
            value: notify
                .summary_url
                .as_ref()
                .map(|url| redact_url(url.expose_secret()))
                .unwrap_or_else(|| "<unset>".to_string()),
        },
        Field {
            key: "notify.callback_url",
            env: &["IVRBOOK_NOTIFY_CALLBACK_URL"],
            overridden: overrides.callback_url.is_some(),
            value: notify.callback_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        },
        Field {
            key: "notify.timeout_secs",
            env: &["IVRBOOK_NOTIFY_TIMEOUT_SECS"],
            overridden: overrides.notify_timeout_secs.is_some(),
            value: notify.timeout_secs.to_string(),
        },
        Field {
            key: "logging.level",
            env: &["IVRBOOK_LOGGING_LEVEL", "IVRBOOK_LOG_LEVEL"],
            overridden: overrides.log_level.is_some(),
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env: &["IVRBOOK_LOGGING_FORMAT", "IVRBOOK_LOG_FORMAT"],
            overridden: false,
            value: format!("{:?}", config.logging.format),
        },
    ];

    let mut lines = vec!["effective config (source precedence: override > env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key,
            field.overridden,
            field.env,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("ivrbook.toml"), PathBuf::from("config/ivrbook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    overridden: bool,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if overridden {
        return "override (command line)".to_string();
    }

    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps scheme and host; the path of a chat webhook is its credential.
pub fn redact_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split('/').next().unwrap_or_default();
            format!("{scheme}://{host}/***")
        }
        None => "<redacted>".to_string(),
    }
}
