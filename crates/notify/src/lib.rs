//! HTTP delivery of the post-call summary and callback webhooks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

use ivrbook_core::config::NotifyConfig;
use ivrbook_core::domain::notification::{CallbackNotification, SummaryNotification};
use ivrbook_core::errors::NotifyError;
use ivrbook_core::notify::{Delivery, NotificationSink};

/// Posts JSON to the configured endpoints, one attempt each. An endpoint
/// that is not configured is skipped.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    summary_url: Option<SecretString>,
    callback_url: Option<String>,
}

impl WebhookNotifier {
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| NotifyError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            summary_url: config.summary_url.clone(),
            callback_url: config.callback_url.clone(),
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        kind: &'static str,
        url: &str,
        body: &T,
    ) -> Result<Delivery, NotifyError> {
        let response = self.client.post(url).json(body).send().await.map_err(|error| {
            if error.is_builder() {
                NotifyError::Serialization(error.to_string())
            } else {
                // reqwest errors carry the URL; the summary URL embeds a token.
                NotifyError::Transport(error.without_url().to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "notify.webhook.rejected",
                kind,
                status = %status,
                "webhook rejected"
            );
            return Err(NotifyError::Status { status: status.as_u16() });
        }

        debug!(event_name = "notify.webhook.accepted", kind, status = %status, "webhook accepted");
        Ok(Delivery::Delivered)
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn send_summary(&self, summary: &SummaryNotification) -> Result<Delivery, NotifyError> {
        match &self.summary_url {
            Some(url) => self.post("summary", url.expose_secret(), summary).await,
            None => Ok(Delivery::Unconfigured),
        }
    }

    async fn send_callback(
        &self,
        callback: &CallbackNotification,
    ) -> Result<Delivery, NotifyError> {
        match &self.callback_url {
            Some(url) => self.post("callback", url, callback).await,
            None => Ok(Delivery::Unconfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use ivrbook_core::config::NotifyConfig;
    use ivrbook_core::domain::notification::{CallbackNotification, SummaryNotification};
    use ivrbook_core::errors::NotifyError;
    use ivrbook_core::notify::{Delivery, NotificationSink};

    use crate::WebhookNotifier;

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn capture(State(captured): State<Captured>, Json(body): Json<Value>) -> StatusCode {
        captured.lock().expect("capture lock").push(body);
        StatusCode::NO_CONTENT
    }

    async fn reject() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn serve() -> (String, Captured) {
        let captured = Captured::default();
        let router = Router::new()
            .route("/hook", post(capture))
            .route("/broken", post(reject))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let address = listener.local_addr().expect("local address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        (format!("http://{address}"), captured)
    }

    fn config(summary: Option<String>, callback: Option<String>) -> NotifyConfig {
        NotifyConfig {
            summary_url: summary.map(Into::into),
            callback_url: callback,
            timeout_secs: 2,
        }
    }

    fn callback() -> CallbackNotification {
        let at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|date| date.and_hms_opt(9, 30, 0))
            .expect("valid timestamp");
        CallbackNotification::new("01012345678", true, at)
    }

    #[tokio::test]
    async fn posts_json_payloads_to_configured_endpoints() {
        let (base, captured) = serve().await;
        let notifier = WebhookNotifier::from_config(&config(
            Some(format!("{base}/hook")),
            Some(format!("{base}/hook")),
        ))
        .expect("client");

        let summary = SummaryNotification { content: "New reservation received.".to_owned() };
        assert_eq!(notifier.send_summary(&summary).await, Ok(Delivery::Delivered));
        assert_eq!(notifier.send_callback(&callback()).await, Ok(Delivery::Delivered));

        let bodies = captured.lock().expect("capture lock").clone();
        assert_eq!(
            bodies,
            vec![
                json!({ "content": "New reservation received." }),
                json!({
                    "reservation_id": "01012345678",
                    "status": "confirmed",
                    "callback_time": "2026-10-19 09:30:00",
                }),
            ]
        );
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (base, _) = serve().await;
        let notifier =
            WebhookNotifier::from_config(&config(None, Some(format!("{base}/broken"))))
                .expect("client");

        assert_eq!(
            notifier.send_callback(&callback()).await,
            Err(NotifyError::Status { status: 500 })
        );
    }

    #[tokio::test]
    async fn unconfigured_endpoints_are_skipped() {
        let notifier = WebhookNotifier::from_config(&config(None, None)).expect("client");

        let summary = SummaryNotification { content: "unused".to_owned() };
        assert_eq!(notifier.send_summary(&summary).await, Ok(Delivery::Unconfigured));
        assert_eq!(notifier.send_callback(&callback()).await, Ok(Delivery::Unconfigured));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error_without_the_secret_url() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let address = listener.local_addr().expect("local address");
        drop(listener);

        let url = format!("http://{address}/api/webhooks/123/secret-token");
        let notifier = WebhookNotifier::from_config(&config(Some(url), None)).expect("client");
        let summary = SummaryNotification { content: "lost".to_owned() };

        let error = notifier.send_summary(&summary).await.expect_err("nothing listening");
        assert!(matches!(
            &error,
            NotifyError::Transport(message) if !message.contains("secret-token")
        ));
    }
}
