use tracing::{info, warn};

use crate::config::TelephonyConfig;
use crate::domain::field::FieldKind;
use crate::errors::CollectError;
use crate::flows::{FieldEvent, FieldFlow, FieldState, FlowTransitionError};
use crate::prompts::AssetCatalog;
use crate::telephony::Telephony;

/// Prompt, error cue and digit bound for one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPrompt {
    pub field: FieldKind,
    pub prompt: &'static str,
    pub invalid: &'static str,
    pub max_digits: u8,
}

impl FieldPrompt {
    pub fn for_field(field: FieldKind) -> Self {
        Self {
            field,
            prompt: field.prompt_asset(),
            invalid: field.invalid_asset(),
            max_digits: field.max_digits(),
        }
    }
}

/// Bounded-retry input loop. Each attempt plays the prompt, waits for
/// digits, and either returns the validated input or plays the error cue.
/// Running out of attempts hangs up the call.
#[derive(Clone, Debug)]
pub struct InputCollector {
    flow: FieldFlow,
    timeout_ms: u64,
    tone_asset: String,
    catalog: AssetCatalog,
}

impl InputCollector {
    pub fn new(
        max_retry: u32,
        timeout_ms: u64,
        tone_asset: impl Into<String>,
        catalog: AssetCatalog,
    ) -> Self {
        Self { flow: FieldFlow::new(max_retry), timeout_ms, tone_asset: tone_asset.into(), catalog }
    }

    pub fn from_config(config: &TelephonyConfig) -> Self {
        Self::new(
            config.max_retry,
            config.timeout_ms,
            config.tone_asset.clone(),
            AssetCatalog::new(config.asset_prefix.clone()),
        )
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn max_retry(&self) -> u32 {
        self.flow.max_retry()
    }

    pub async fn collect<T, V>(
        &self,
        telephony: &mut T,
        prompt: &FieldPrompt,
        validate: V,
    ) -> Result<String, CollectError>
    where
        T: Telephony + ?Sized,
        V: Fn(&str) -> bool,
    {
        let max_retry = self.flow.max_retry();
        let mut state = self.flow.initial_state();

        loop {
            let attempt = match state {
                FieldState::Prompting { attempt } => attempt,
                FieldState::Done | FieldState::Terminated => {
                    return Err(FlowTransitionError::InvalidTransition {
                        state,
                        event: FieldEvent::InputRejected,
                    }
                    .into());
                }
            };

            telephony.play(&self.catalog.resolve(prompt.prompt)).await?;
            let raw = telephony
                .collect_digits(&self.tone_asset, self.timeout_ms, prompt.max_digits)
                .await?;
            let input = raw.trim();

            if validate(input) {
                self.flow.apply(&state, &FieldEvent::InputAccepted)?;
                info!(
                    event_name = "call.field.accepted",
                    field = prompt.field.as_str(),
                    attempt,
                    input,
                    "field input accepted"
                );
                return Ok(input.to_owned());
            }

            telephony.play(&self.catalog.resolve(prompt.invalid)).await?;
            warn!(
                event_name = "call.field.rejected",
                field = prompt.field.as_str(),
                attempt,
                max_retry,
                input,
                "field input rejected"
            );
            console(
                telephony,
                &format!(
                    "invalid {} input '{input}' (attempt {attempt}/{max_retry})",
                    prompt.field
                ),
            )
            .await;

            state = self.flow.apply(&state, &FieldEvent::InputRejected)?.to;
            if state == FieldState::Terminated {
                warn!(
                    event_name = "call.field.retry_exhausted",
                    field = prompt.field.as_str(),
                    attempts = attempt,
                    "retry budget exhausted, hanging up"
                );
                console(telephony, "retry budget exhausted, ending call").await;
                telephony.hangup().await?;
                return Err(CollectError::RetryExhausted { field: prompt.field, attempts: attempt });
            }
        }
    }
}

/// Console lines are diagnostics; a failed one is logged and never ends the
/// call. A dead channel shows up on the next playback or hangup.
async fn console<T>(telephony: &mut T, message: &str)
where
    T: Telephony + ?Sized,
{
    if let Err(error) = telephony.verbose(message).await {
        warn!(event_name = "call.console.failed", error = %error, "console line not delivered");
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::from_config(&TelephonyConfig::default())
    }
}
