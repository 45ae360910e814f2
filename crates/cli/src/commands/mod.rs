pub mod agi;
pub mod config;
pub mod doctor;
pub mod simulate;

use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_TELEPHONY: u8 = 3;
pub const EXIT_NOTIFY: u8 = 4;
pub const EXIT_USAGE: u8 = 5;
pub const EXIT_RUNTIME: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<Value>,
}

impl CommandResult {
    /// Success carrying a structured report next to the message.
    pub fn success_with_report(
        command: &str,
        message: impl Into<String>,
        report: &impl Serialize,
    ) -> Self {
        let report = match serde_json::to_value(report) {
            Ok(report) => report,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), EXIT_RUNTIME)
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            report: Some(report),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            report: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}
