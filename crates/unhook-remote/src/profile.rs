//! Remote profile mirror.
//!
//! A best-effort, write-only copy of public progress fields. The local
//! habit store stays authoritative; nothing is ever read back.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use unhook_settings::SyncSettings;

use crate::errors::SyncError;

/// Path of the profiles table under the base URL.
const PROFILES_PATH: &str = "/profiles";

/// Public progress fields mirrored remotely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    /// Display name.
    pub user_name: String,
    /// Habit kind on the wire.
    pub habit_type: String,
    /// Custom habit name when the kind is `other`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_habit_name: Option<String>,
    /// Current streak in days.
    pub current_streak: u32,
    /// Longest streak in days.
    pub longest_streak: u32,
    /// Number of relapses.
    pub relapse_count: u32,
    /// XP within the current level.
    pub xp: u32,
    /// Current level.
    pub level: u32,
}

/// Remote upsert target for [`ProfileSnapshot`]s.
#[async_trait]
pub trait ProfileMirror: Send + Sync {
    /// Insert or update the caller's profile.
    async fn upsert(&self, snapshot: &ProfileSnapshot) -> Result<(), SyncError>;
}

/// Profile mirror over a REST upsert endpoint.
#[derive(Clone, Debug)]
pub struct HttpProfileMirror {
    client: reqwest::Client,
    url: String,
    bearer: Option<String>,
}

impl HttpProfileMirror {
    /// Mirror for the configured endpoint, authenticating with `bearer`.
    pub fn new(settings: &SyncSettings, bearer: Option<String>) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}{PROFILES_PATH}", settings.base_url.trim_end_matches('/')),
            bearer,
        })
    }

    /// Full endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ProfileMirror for HttpProfileMirror {
    #[tracing::instrument(skip_all, fields(streak = snapshot.current_streak))]
    async fn upsert(&self, snapshot: &ProfileSnapshot) -> Result<(), SyncError> {
        let mut req = self
            .client
            .post(&self.url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(snapshot);
        if let Some(token) = &self.bearer {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                message,
            });
        }
        debug!("profile mirrored");
        Ok(())
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

    fn snapshot() -> ProfileSnapshot {
        ProfileSnapshot {
            user_name: "Deniz".to_string(),
            habit_type: "other".to_string(),
            custom_habit_name: Some("Energy drinks".to_string()),
            current_streak: 12,
            longest_streak: 20,
            relapse_count: 1,
            xp: 40,
            level: 3,
        }
    }

    fn mirror_for(server: &MockServer) -> HttpProfileMirror {
        let settings = SyncSettings {
            enabled: true,
            base_url: format!("{}/rest/v1", server.uri()),
            timeout_ms: 5_000,
        };
        HttpProfileMirror::new(&settings, Some("jwt".to_string())).unwrap()
    }

    #[test]
    fn snapshot_omits_missing_custom_name() {
        let snap = ProfileSnapshot {
            custom_habit_name: None,
            ..snapshot()
        };
        let json = serde_json::to_value(snap).unwrap();
        assert!(json.get("customHabitName").is_none());
        assert_eq!(json["currentStreak"], 12);
    }

    #[tokio::test]
    async fn upsert_posts_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(header("authorization", "Bearer jwt"))
            .and(header("prefer", "resolution=merge-duplicates"))
            .and(body_json(serde_json::json!({
                "userName": "Deniz",
                "habitType": "other",
                "customHabitName": "Energy drinks",
                "currentStreak": 12,
                "longestStreak": 20,
                "relapseCount": 1,
                "xp": 40,
                "level": 3
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        mirror_for(&server).upsert(&snapshot()).await.unwrap();
    }

    #[tokio::test]
    async fn upsert_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
            .mount(&server)
            .await;

        let err = mirror_for(&server).upsert(&snapshot()).await.unwrap_err();
        assert_matches!(err, SyncError::Status { status: 401, .. });
        assert!(err.to_string().contains("JWT expired"));
    }
}
