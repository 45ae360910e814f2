use ivrbook_agi::connect_stdio;
use ivrbook_core::call::{CallOutcome, ReservationCall};
use ivrbook_core::config::AppConfig;
use ivrbook_core::notify::SystemClock;
use ivrbook_notify::WebhookNotifier;
use tracing::{error, info};

use crate::commands::{runtime, CommandResult, EXIT_NOTIFY, EXIT_TELEPHONY};

/// Runs one reservation call over stdin/stdout. The returned result must
/// not be written to stdout, which belongs to the PBX.
pub fn run(config: &AppConfig) -> CommandResult {
    let notifier = match WebhookNotifier::from_config(&config.notify) {
        Ok(notifier) => notifier,
        Err(error) => {
            return CommandResult::failure("agi", "notify_client", error.to_string(), EXIT_NOTIFY)
        }
    };
    let runtime = match runtime("agi") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let call = ReservationCall::new(&config.telephony, notifier, SystemClock);
    let result = runtime.block_on(async {
        let mut channel = connect_stdio().await?;
        call.run(&mut channel).await
    });

    match result {
        Ok(outcome) => {
            let message = describe(&outcome);
            info!(event_name = "cli.agi.finished", outcome = %message, "agi call finished");
            CommandResult::success_with_report("agi", message, &outcome)
        }
        Err(call_error) => {
            error!(event_name = "cli.agi.failed", error = %call_error, "agi call failed");
            CommandResult::failure("agi", "telephony", call_error.to_string(), EXIT_TELEPHONY)
        }
    }
}

pub(crate) fn describe(outcome: &CallOutcome) -> String {
    match outcome {
        CallOutcome::Completed { reservation, .. } => format!(
            "reservation {} for {}",
            if reservation.confirmed { "confirmed" } else { "canceled" },
            reservation.appointment_label()
        ),
        CallOutcome::Terminated { field, attempts, .. } => {
            format!("call terminated after {attempts} invalid {field} inputs")
        }
    }
}
