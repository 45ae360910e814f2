use ivrbook_core::call::{CallOutcome, ReservationCall};
use ivrbook_core::config::AppConfig;
use ivrbook_core::notify::{NotificationSink, RecordedNotification, RecordingNotifier, SystemClock};
use ivrbook_core::telephony::{ScriptedTelephony, UNKNOWN_CALLER};
use ivrbook_notify::WebhookNotifier;
use serde::Serialize;

use crate::commands::agi::describe;
use crate::commands::{runtime, CommandResult, EXIT_NOTIFY, EXIT_TELEPHONY, EXIT_USAGE};

#[derive(Debug, Serialize)]
struct SimulationReport {
    outcome: CallOutcome,
    transcript: Vec<String>,
    console: Vec<String>,
    /// Notifications captured instead of sent, empty with `--send`.
    recorded: Vec<String>,
}

/// Splits `5,15,1` into keypad entries. An empty entry is a timeout.
pub fn parse_digits(raw: &str) -> Result<Vec<String>, String> {
    let entries: Vec<String> = raw.split(',').map(|entry| entry.trim().to_owned()).collect();
    if let Some(bad) =
        entries.iter().find(|entry| !entry.bytes().all(|byte| byte.is_ascii_digit()))
    {
        return Err(format!("keypad entry `{bad}` contains non-digit characters"));
    }
    Ok(entries)
}

pub fn run(config: &AppConfig, digits: &str, caller_id: Option<&str>, send: bool) -> CommandResult {
    let inputs = match parse_digits(digits) {
        Ok(inputs) => inputs,
        Err(message) => return CommandResult::failure("simulate", "usage", message, EXIT_USAGE),
    };
    let channel = ScriptedTelephony::new(caller_id.unwrap_or(UNKNOWN_CALLER), inputs);

    if send {
        match WebhookNotifier::from_config(&config.notify) {
            Ok(notifier) => simulate(config, notifier, channel, |_| Vec::new()),
            Err(error) => {
                CommandResult::failure("simulate", "notify_client", error.to_string(), EXIT_NOTIFY)
            }
        }
    } else {
        simulate(config, RecordingNotifier::default(), channel, |notifier| {
            notifier.sent().iter().map(render_recorded).collect()
        })
    }
}

fn simulate<N, F>(
    config: &AppConfig,
    notifier: N,
    mut channel: ScriptedTelephony,
    recorded: F,
) -> CommandResult
where
    N: NotificationSink,
    F: FnOnce(&N) -> Vec<String>,
{
    let runtime = match runtime("simulate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let call = ReservationCall::new(&config.telephony, notifier, SystemClock);

    match runtime.block_on(call.run(&mut channel)) {
        Ok(outcome) => {
            let report = SimulationReport {
                transcript: channel.actions().iter().map(ToString::to_string).collect(),
                console: channel.console().to_vec(),
                recorded: recorded(call.notifier()),
                outcome,
            };
            CommandResult::success_with_report("simulate", describe(&report.outcome), &report)
        }
        Err(error) => {
            CommandResult::failure("simulate", "telephony", error.to_string(), EXIT_TELEPHONY)
        }
    }
}

fn render_recorded(notification: &RecordedNotification) -> String {
    match notification {
        RecordedNotification::Summary(summary) => format!("summary: {}", summary.content),
        RecordedNotification::Callback(callback) => format!(
            "callback: {} {} at {}",
            callback.reservation_id,
            callback.status.as_str(),
            callback.callback_time
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::simulate::parse_digits;

    #[test]
    fn keypad_script_splits_on_commas() {
        assert_eq!(
            parse_digits("5, 15,1,,30").expect("valid script"),
            vec!["5", "15", "1", "", "30"]
        );
        assert!(parse_digits("5,a").is_err());
        assert!(parse_digits("5,-1").is_err());
    }
}
