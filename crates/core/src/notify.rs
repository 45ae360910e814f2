use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::notification::{CallbackNotification, SummaryNotification};
use crate::domain::reservation::ReservationRequest;
use crate::errors::NotifyError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No endpoint is configured for this notification.
    Unconfigured,
}

/// Outbound webhook endpoints a finished call reports to. Implementations
/// make a single attempt per call; there is no retry.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_summary(&self, summary: &SummaryNotification) -> Result<Delivery, NotifyError>;

    async fn send_callback(
        &self,
        callback: &CallbackNotification,
    ) -> Result<Delivery, NotifyError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedNotification {
    Summary(SummaryNotification),
    Callback(CallbackNotification),
}

/// Keeps every notification it is handed. Optionally fails each delivery
/// after recording it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<RecordedNotification>>>,
    failure: Option<NotifyError>,
}

impl RecordingNotifier {
    pub fn failing(error: NotifyError) -> Self {
        Self { sent: Arc::default(), failure: Some(error) }
    }

    pub fn sent(&self) -> Vec<RecordedNotification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, notification: RecordedNotification) -> Result<Delivery, NotifyError> {
        match self.sent.lock() {
            Ok(mut sent) => sent.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(Delivery::Delivered),
        }
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn send_summary(&self, summary: &SummaryNotification) -> Result<Delivery, NotifyError> {
        self.push(RecordedNotification::Summary(summary.clone()))
    }

    async fn send_callback(
        &self,
        callback: &CallbackNotification,
    ) -> Result<Delivery, NotifyError> {
        self.push(RecordedNotification::Callback(callback.clone()))
    }
}

/// Source of the local wall-clock time stamped on callbacks.
pub trait Clock: Send + Sync {
    fn now_local(&self) -> NaiveDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum NotificationStatus {
    Delivered,
    Unconfigured,
    /// Not applicable to this outcome (summary of a cancelled booking).
    NotSent,
    Failed(String),
}

impl From<Result<Delivery, NotifyError>> for NotificationStatus {
    fn from(value: Result<Delivery, NotifyError>) -> Self {
        match value {
            Ok(Delivery::Delivered) => Self::Delivered,
            Ok(Delivery::Unconfigured) => Self::Unconfigured,
            Err(error) => Self::Failed(error.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub summary: NotificationStatus,
    pub callback: NotificationStatus,
}

/// Sends the summary (confirmed bookings only) and then the callback.
/// Failures are logged and reported, never propagated.
pub async fn dispatch_notifications<N, C>(
    notifier: &N,
    clock: &C,
    reservation: &ReservationRequest,
) -> DispatchReport
where
    N: NotificationSink + ?Sized,
    C: Clock + ?Sized,
{
    let summary = if reservation.confirmed {
        let result =
            notifier.send_summary(&SummaryNotification::for_reservation(reservation)).await;
        log_delivery("summary", &result);
        NotificationStatus::from(result)
    } else {
        NotificationStatus::NotSent
    };

    let callback = CallbackNotification::new(
        reservation.caller_id.clone(),
        reservation.confirmed,
        clock.now_local(),
    );
    let result = notifier.send_callback(&callback).await;
    log_delivery("callback", &result);

    DispatchReport { summary, callback: NotificationStatus::from(result) }
}

fn log_delivery(kind: &'static str, result: &Result<Delivery, NotifyError>) {
    match result {
        Ok(Delivery::Delivered) => {
            info!(event_name = "call.notify.delivered", kind, "notification delivered")
        }
        Ok(Delivery::Unconfigured) => {
            info!(event_name = "call.notify.skipped", kind, "notification endpoint not configured")
        }
        Err(error) => warn!(
            event_name = "call.notify.failed",
            kind,
            error = %error,
            "notification delivery failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::notification::{CallbackStatus, SummaryNotification};
    use crate::domain::reservation::{Meridiem, ReservationRequest};
    use crate::errors::NotifyError;
    use crate::notify::{
        dispatch_notifications, FixedClock, NotificationStatus, RecordedNotification,
        RecordingNotifier,
    };

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .and_then(|date| date.and_hms_opt(14, 3, 9))
                .expect("valid timestamp"),
        )
    }

    fn reservation(confirmed: bool) -> ReservationRequest {
        ReservationRequest {
            month: 5,
            day: 15,
            meridiem: Meridiem::Am,
            hour: 10,
            minute: 30,
            caller_id: "01012345678".to_owned(),
            confirmed,
        }
    }

    #[tokio::test]
    async fn confirmed_booking_sends_summary_then_callback() {
        let notifier = RecordingNotifier::default();
        let report = dispatch_notifications(&notifier, &clock(), &reservation(true)).await;

        assert_eq!(report.summary, NotificationStatus::Delivered);
        assert_eq!(report.callback, NotificationStatus::Delivered);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0],
            RecordedNotification::Summary(SummaryNotification::for_reservation(&reservation(
                true
            )))
        );
        match &sent[1] {
            RecordedNotification::Callback(callback) => {
                assert_eq!(callback.status, CallbackStatus::Confirmed);
                assert_eq!(callback.reservation_id, "01012345678");
                assert_eq!(callback.callback_time, "2026-10-19 14:03:09");
            }
            other => panic!("expected callback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_booking_sends_only_rejected_callback() {
        let notifier = RecordingNotifier::default();
        let report = dispatch_notifications(&notifier, &clock(), &reservation(false)).await;

        assert_eq!(report.summary, NotificationStatus::NotSent);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            &sent[0],
            RecordedNotification::Callback(callback) if callback.status == CallbackStatus::Rejected
        ));
    }

    #[tokio::test]
    async fn delivery_failures_are_reported_not_propagated() {
        let notifier =
            RecordingNotifier::failing(NotifyError::Transport("connection refused".to_owned()));
        let report = dispatch_notifications(&notifier, &clock(), &reservation(true)).await;

        assert!(matches!(report.summary, NotificationStatus::Failed(ref message)
            if message.contains("connection refused")));
        assert!(matches!(report.callback, NotificationStatus::Failed(_)));
        assert_eq!(notifier.sent().len(), 2, "callback still attempted after summary failure");
    }
}
