//! AI coach client.
//!
//! Request `{ message, habitType, streak, userName }`, response `{ reply }`.
//! Premium gating and rate limiting arrive either as HTTP 402/429 or as an
//! `{"error": "premium_required" | "rate_limited"}` body, and are mapped to
//! the dedicated [`CoachError`] variants.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use unhook_settings::CoachSettings;

use crate::errors::CoachError;

/// Error code for premium gating.
pub const PREMIUM_REQUIRED_CODE: &str = "premium_required";

/// Error code for coach rate limiting.
pub const RATE_LIMITED_CODE: &str = "rate_limited";

/// Path of the coach function under the base URL.
const COACH_PATH: &str = "/ai-coach";

/// One coach turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachRequest {
    /// User message, already sanitized and filtered.
    pub message: String,
    /// Habit kind on the wire (`smoking`, `social_media`, ...).
    pub habit_type: String,
    /// Current streak in days.
    pub streak: u32,
    /// Display name.
    pub user_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct CoachResponse {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Remote AI coach.
#[async_trait]
pub trait CoachClient: Send + Sync {
    /// Ask the coach to answer `request`.
    async fn reply(&self, request: &CoachRequest) -> Result<String, CoachError>;
}

/// Coach over HTTP.
#[derive(Clone, Debug)]
pub struct HttpCoachClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpCoachClient {
    /// Client for the configured endpoint.
    pub fn new(settings: &CoachSettings) -> Result<Self, CoachError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self::with_client(client, settings))
    }

    /// Client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, settings: &CoachSettings) -> Self {
        Self {
            client,
            url: format!("{}{COACH_PATH}", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
        }
    }

    /// Full endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CoachClient for HttpCoachClient {
    #[tracing::instrument(skip_all, fields(habit = %request.habit_type, streak = request.streak))]
    async fn reply(&self, request: &CoachRequest) -> Result<String, CoachError> {
        let mut req = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        let status = resp.status().as_u16();
        match status {
            402 => return Err(CoachError::PremiumRequired),
            429 => return Err(CoachError::RateLimited),
            _ => {}
        }

        let text = resp.text().await?;
        if !(200..300).contains(&status) {
            let code = serde_json::from_str::<CoachResponse>(&text)
                .ok()
                .and_then(|r| r.error);
            return Err(match code.as_deref() {
                Some(PREMIUM_REQUIRED_CODE) => CoachError::PremiumRequired,
                Some(RATE_LIMITED_CODE) => CoachError::RateLimited,
                Some(other) => CoachError::Status {
                    status,
                    message: other.to_string(),
                },
                None => CoachError::Status {
                    status,
                    message: text,
                },
            });
        }

        let body: CoachResponse = serde_json::from_str(&text)?;
        match (body.error.as_deref(), body.reply) {
            (Some(PREMIUM_REQUIRED_CODE), _) => Err(CoachError::PremiumRequired),
            (Some(RATE_LIMITED_CODE), _) => Err(CoachError::RateLimited),
            (_, Some(reply)) if !reply.trim().is_empty() => {
                debug!(chars = reply.chars().count(), "coach replied");
                Ok(reply)
            }
            (Some(other), _) => Err(CoachError::Status {
                status,
                message: other.to_string(),
            }),
            (None, _) => Err(CoachError::EmptyReply),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CoachRequest {
        CoachRequest {
            message: "I really want a cigarette".to_string(),
            habit_type: "smoking".to_string(),
            streak: 4,
            user_name: "Deniz".to_string(),
        }
    }

    fn client_for(server: &MockServer, api_key: Option<&str>) -> HttpCoachClient {
        let settings = CoachSettings {
            base_url: format!("{}/functions/v1/", server.uri()),
            timeout_ms: 5_000,
            api_key: api_key.map(str::to_string),
        };
        HttpCoachClient::new(&settings).unwrap()
    }

    #[test]
    fn request_serializes_camel_case() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["habitType"], "smoking");
        assert_eq!(json["userName"], "Deniz");
        assert_eq!(json["streak"], 4);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let settings = CoachSettings {
            base_url: "https://example.test/functions/v1/".to_string(),
            ..CoachSettings::default()
        };
        let client = HttpCoachClient::new(&settings).unwrap();
        assert_eq!(client.url(), "https://example.test/functions/v1/ai-coach");
    }

    #[tokio::test]
    async fn reply_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/ai-coach"))
            .and(header("authorization", "Bearer anon-key"))
            .and(body_json(serde_json::json!({
                "message": "I really want a cigarette",
                "habitType": "smoking",
                "streak": 4,
                "userName": "Deniz"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"reply": "Take ten slow breaths."})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some("anon-key"));
        let reply = client.reply(&request()).await.unwrap();
        assert_eq!(reply, "Take ten slow breaths.");
    }

    #[tokio::test]
    async fn premium_required_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;

        let result = client_for(&server, None).reply(&request()).await;
        assert_matches!(result, Err(CoachError::PremiumRequired));
    }

    #[tokio::test]
    async fn premium_required_by_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"error": "premium_required"})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server, None).reply(&request()).await;
        assert_matches!(result, Err(CoachError::PremiumRequired));
    }

    #[tokio::test]
    async fn rate_limited_by_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;
        assert_matches!(
            client_for(&server, None).reply(&request()).await,
            Err(CoachError::RateLimited)
        );

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "rate_limited"})),
            )
            .mount(&server)
            .await;
        assert_matches!(
            client_for(&server, None).reply(&request()).await,
            Err(CoachError::RateLimited)
        );
    }

    #[tokio::test]
    async fn server_error_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let err = client_for(&server, None).reply(&request()).await.unwrap_err();
        assert_matches!(err, CoachError::Status { status: 500, ref message } if message == "internal");
    }

    #[tokio::test]
    async fn missing_reply_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let result = client_for(&server, None).reply(&request()).await;
        assert_matches!(result, Err(CoachError::EmptyReply));
    }

    #[tokio::test]
    async fn invalid_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let result = client_for(&server, None).reply(&request()).await;
        assert_matches!(result, Err(CoachError::Json(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_http_error() {
        let settings = CoachSettings {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 1_000,
            api_key: None,
        };
        let client = HttpCoachClient::new(&settings).unwrap();
        assert_matches!(client.reply(&request()).await, Err(CoachError::Http(_)));
    }
}
