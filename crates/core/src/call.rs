use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::collect::{FieldPrompt, InputCollector};
use crate::config::TelephonyConfig;
use crate::domain::field::{validate_field, FieldKind};
use crate::domain::reservation::{Decision, ReservationDraft, ReservationRequest};
use crate::errors::{CallError, CollectError, DomainError};
use crate::flows::{CallFlow, CallStage};
use crate::notify::{dispatch_notifications, Clock, DispatchReport, NotificationSink};
use crate::prompts::{self, echo_cues, play_cues, readback_cues, Cue};
use crate::telephony::Telephony;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CallOutcome {
    /// The caller answered the confirmation prompt, either way.
    Completed {
        correlation_id: String,
        reservation: ReservationRequest,
        notifications: DispatchReport,
    },
    /// A field ran out of attempts and the call was hung up.
    Terminated { correlation_id: String, field: FieldKind, attempts: u32 },
}

impl CallOutcome {
    pub fn reservation(&self) -> Option<&ReservationRequest> {
        match self {
            Self::Completed { reservation, .. } => Some(reservation),
            Self::Terminated { .. } => None,
        }
    }
}

/// One booking call, start to finish: greeting, the six collection stages,
/// readback, confirmation and notification dispatch.
pub struct ReservationCall<N, C> {
    collector: InputCollector,
    flow: CallFlow,
    welcome_pause_secs: u64,
    notifier: N,
    clock: C,
}

impl<N, C> ReservationCall<N, C>
where
    N: NotificationSink,
    C: Clock,
{
    pub fn new(config: &TelephonyConfig, notifier: N, clock: C) -> Self {
        Self {
            collector: InputCollector::from_config(config),
            flow: CallFlow,
            welcome_pause_secs: config.welcome_pause_secs,
            notifier,
            clock,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub async fn run<T>(&self, telephony: &mut T) -> Result<CallOutcome, CallError>
    where
        T: Telephony + ?Sized,
    {
        let correlation_id = Uuid::new_v4().to_string();
        let span = info_span!("call", correlation_id = %correlation_id);
        self.run_stages(telephony, correlation_id.clone()).instrument(span).await
    }

    async fn run_stages<T>(
        &self,
        telephony: &mut T,
        correlation_id: String,
    ) -> Result<CallOutcome, CallError>
    where
        T: Telephony + ?Sized,
    {
        let catalog = self.collector.catalog();
        let mut stage = self.flow.initial_stage();

        telephony.answer().await?;
        let caller_id = telephony.caller_id().to_owned();
        info!(event_name = "call.answered", caller_id = %caller_id, "call answered");
        telephony.verbose(&format!("reservation call from {caller_id}")).await?;
        play_cues(telephony, catalog, &[Cue::Play(prompts::WELCOME)]).await?;
        if self.welcome_pause_secs > 0 {
            telephony.pause(self.welcome_pause_secs).await?;
        }

        let mut draft = ReservationDraft::new(caller_id);
        for field in &FieldKind::ORDER[..5] {
            stage = self.flow.advance(stage)?;
            let input = match self.collect(telephony, *field, &draft).await? {
                Some(input) => input,
                None => return self.terminated(stage, *field, correlation_id),
            };
            draft.record(*field, &input)?;
            play_cues(telephony, catalog, &echo_cues(*field, &draft)).await?;
        }

        stage = self.flow.advance(stage)?;
        play_cues(telephony, catalog, &readback_cues(&draft)?).await?;

        stage = self.flow.advance(stage)?;
        let Some(input) = self.collect(telephony, FieldKind::Confirmation, &draft).await? else {
            return self.terminated(stage, FieldKind::Confirmation, correlation_id);
        };
        let decision = Decision::from_digits(&input).ok_or(DomainError::InvalidFieldValue {
            field: FieldKind::Confirmation,
            input: input.clone(),
        })?;
        let reservation = draft.finalize(decision)?;

        let closing =
            if reservation.confirmed { prompts::RESERVATION_CONFIRMED } else { prompts::RESERVATION_CANCELED };
        play_cues(telephony, catalog, &[Cue::Play(closing)]).await?;
        info!(
            event_name = "call.reservation.decided",
            confirmed = reservation.confirmed,
            appointment = %reservation.appointment_label(),
            "reservation decision recorded"
        );

        stage = self.flow.advance(stage)?;
        let notifications = dispatch_notifications(&self.notifier, &self.clock, &reservation).await;

        play_cues(telephony, catalog, &[Cue::Play(prompts::THANK_YOU)]).await?;
        telephony.hangup().await?;
        stage = self.flow.advance(stage)?;
        info!(event_name = "call.completed", stage = ?stage, "call completed");

        Ok(CallOutcome::Completed { correlation_id, reservation, notifications })
    }

    /// `None` when the field's retry budget ran out; the channel is already
    /// hung up at that point.
    async fn collect<T>(
        &self,
        telephony: &mut T,
        field: FieldKind,
        draft: &ReservationDraft,
    ) -> Result<Option<String>, CallError>
    where
        T: Telephony + ?Sized,
    {
        let meridiem = draft.meridiem();
        let result = self
            .collector
            .collect(telephony, &FieldPrompt::for_field(field), |input| {
                validate_field(field, input, meridiem)
            })
            .await;

        match result {
            Ok(input) => Ok(Some(input)),
            Err(CollectError::RetryExhausted { .. }) => Ok(None),
            Err(CollectError::Telephony(error)) => Err(error.into()),
            Err(CollectError::Flow(error)) => Err(error.into()),
        }
    }

    fn terminated(
        &self,
        stage: CallStage,
        field: FieldKind,
        correlation_id: String,
    ) -> Result<CallOutcome, CallError> {
        let stage = self.flow.terminate(stage)?;
        warn!(
            event_name = "call.terminated",
            field = field.as_str(),
            stage = ?stage,
            "call terminated after exhausting retries"
        );
        Ok(CallOutcome::Terminated {
            correlation_id,
            field,
            attempts: self.collector.max_retry(),
        })
    }
}
