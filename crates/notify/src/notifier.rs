// [crates/notify/src/notifier.rs]
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use snapforge_models::JobResult;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::event::{should_deliver, EventSeverity, JOB_RESULT_EVENT};
use crate::level::VerbosityLevel;

const CALLBACK_TIMEOUT_SECONDS: u64 = 10;
const SOURCE_VERSION: &str = "1.0.0";

/// Delivers structured progress and outcome events to a caller-supplied
/// webhook URL, filtered by verbosity level (§4.6). Delivery failures are
/// logged and swallowed; the pipeline never fails because a callback
/// could not be reached.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    callback_url: String,
    level: VerbosityLevel,
    job_id: Uuid,
    listing_id: String,
    correlation_id: Uuid,
    function_name: String,
}

impl WebhookNotifier {
    pub fn new(
        callback_url: impl Into<String>,
        level: VerbosityLevel,
        job_id: Uuid,
        listing_id: impl Into<String>,
        correlation_id: Uuid,
        function_name: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            callback_url: callback_url.into(),
            level,
            job_id,
            listing_id: listing_id.into(),
            correlation_id,
            function_name: function_name.into(),
        }
    }

    /// Delivers one structured event if the verbosity policy allows it
    /// (§4.6). `extra` is merged into the payload's event-specific fields.
    pub async fn notify(&self, event_name: &str, severity: EventSeverity, extra: Value) {
        if !should_deliver(event_name, severity, self.level) {
            debug!(event = event_name, level = ?self.level, "event suppressed by verbosity policy");
            return;
        }

        let mut payload = json!({
            "status": event_name,
            "function_name": self.function_name,
            "log_level": if severity == EventSeverity::Error { "error" } else { "info" },
            "job_id": self.job_id,
            "listing_id": self.listing_id,
            "correlation_id": self.correlation_id,
            "version": SOURCE_VERSION,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut payload, extra) {
            base.extend(extra);
        }

        self.deliver(payload).await;
    }

    /// Business-class job-result callback: unfiltered by verbosity (§4.6).
    /// The job's real `status` (e.g. `job_partial_success`) flows through
    /// untouched; `event` distinguishes this payload shape from `notify`'s.
    pub async fn send_job_result(&self, result: &JobResult) {
        let mut payload = serde_json::to_value(result).unwrap_or(json!({}));
        if let Value::Object(map) = &mut payload {
            map.insert("event".to_string(), json!(JOB_RESULT_EVENT));
            map.insert("function_name".to_string(), json!(self.function_name));
        }
        self.deliver(payload).await;
    }

    async fn deliver(&self, payload: Value) {
        let result = self
            .client
            .post(&self.callback_url)
            .timeout(std::time::Duration::from_secs(CALLBACK_TIMEOUT_SECONDS))
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(url = %self.callback_url, "callback delivered");
            }
            Ok(response) => {
                warn!(url = %self.callback_url, status = %response.status(), "callback rejected");
            }
            Err(err) => {
                warn!(url = %self.callback_url, error = %err, "callback delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_successfully_to_a_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/callback")
            .with_status(200)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(
            format!("{}/callback", server.url()),
            VerbosityLevel::Standard,
            Uuid::new_v4(),
            "listing-1",
            Uuid::new_v4(),
            "process",
        );
        notifier
            .notify("job_started", EventSeverity::Info, json!({}))
            .await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_callback_does_not_panic_or_propagate() {
        let notifier = WebhookNotifier::new(
            "http://127.0.0.1:1",
            VerbosityLevel::Standard,
            Uuid::new_v4(),
            "listing-1",
            Uuid::new_v4(),
            "process",
        );
        notifier
            .notify("job_started", EventSeverity::Info, json!({}))
            .await;
    }
}
