//! Coach chat as a two-slot transaction.
//!
//! [`HabitStore::begin_chat_turn`] commits the user message and returns a
//! [`PendingChatTurn`]; the coach is awaited with no lock held; then
//! [`HabitStore::finish_chat_turn`] appends the bot message. The user message
//! is never rolled back, only the bot side varies.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unhook_core::ChatMessageId;
use unhook_remote::{CoachClient, CoachError, CoachRequest};
use unhook_safety::{ContentKind, ValidationError, sanitize_and_validate};

use crate::store::HabitStore;
use crate::types::{ChatMessage, HabitKind};

/// Bot text telling presentation to show the premium upsell.
pub const PREMIUM_REQUIRED_SENTINEL: &str = "__PREMIUM_REQUIRED__";

/// Bot text used when the coach could not answer.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting right now. Take a slow breath, and try again in a moment.";

/// A committed user message waiting for its reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingChatTurn {
    /// ID of the committed user message.
    pub user_message_id: ChatMessageId,
    /// Request to send to the coach.
    pub request: CoachRequest,
}

/// How the bot slot was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatTurnOutcome {
    /// Coach answered.
    Replied,
    /// Coach requires a premium subscription; bot text is the sentinel.
    PremiumRequired,
    /// Coach is rate limiting; bot text is the fallback.
    RateLimited,
    /// Any other failure; bot text is the fallback.
    Failed,
}

/// A finished turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatTurn {
    /// The user message as stored.
    pub user_message: ChatMessage,
    /// The bot message as stored.
    pub bot_message: ChatMessage,
    /// How the bot slot was resolved.
    pub outcome: ChatTurnOutcome,
}

impl HabitStore {
    /// Sanitize and filter `text`, then commit it as a user message.
    pub fn begin_chat_turn(&self, text: &str) -> Result<PendingChatTurn, ValidationError> {
        let sanitized = sanitize_and_validate(ContentKind::Message, text).into_result()?;
        let text = self.filter().filter(&sanitized).safe_text(&sanitized);
        let message = ChatMessage {
            id: ChatMessageId::new(),
            timestamp: self.clock().now(),
            text,
            is_bot: false,
        };

        Ok(self.update(|inner| {
            let state = &mut inner.state;
            let request = CoachRequest {
                message: message.text.clone(),
                habit_type: state
                    .profile
                    .as_ref()
                    .map_or(HabitKind::Other, |p| p.kind)
                    .as_str()
                    .to_string(),
                streak: state.streak.current_streak,
                user_name: state.display_name.clone(),
            };
            let pending = PendingChatTurn {
                user_message_id: message.id.clone(),
                request,
            };
            state.chat.push(message);
            (pending, true)
        }))
    }

    /// Append the bot message for `pending` from the coach result.
    pub fn finish_chat_turn(
        &self,
        pending: PendingChatTurn,
        reply: Result<String, CoachError>,
    ) -> ChatTurn {
        let (text, outcome) = match reply {
            Ok(text) => (text, ChatTurnOutcome::Replied),
            Err(CoachError::PremiumRequired) => {
                debug!("coach requires premium");
                (PREMIUM_REQUIRED_SENTINEL.to_string(), ChatTurnOutcome::PremiumRequired)
            }
            Err(CoachError::RateLimited) => {
                warn!("coach rate limited");
                (FALLBACK_REPLY.to_string(), ChatTurnOutcome::RateLimited)
            }
            Err(err) => {
                warn!(error = %err, "coach request failed");
                (FALLBACK_REPLY.to_string(), ChatTurnOutcome::Failed)
            }
        };
        let bot_message = ChatMessage {
            id: ChatMessageId::new(),
            timestamp: self.clock().now(),
            text,
            is_bot: true,
        };

        self.update(|inner| {
            let chat = &mut inner.state.chat;
            let user_message = chat
                .iter()
                .find(|m| m.id == pending.user_message_id)
                .cloned()
                .unwrap_or_else(|| ChatMessage {
                    id: pending.user_message_id.clone(),
                    timestamp: bot_message.timestamp,
                    text: pending.request.message.clone(),
                    is_bot: false,
                });
            chat.push(bot_message.clone());
            let turn = ChatTurn {
                user_message,
                bot_message,
                outcome,
            };
            (turn, true)
        })
    }

    /// Run a full turn against `coach`.
    pub async fn send_chat_message(
        &self,
        text: &str,
        coach: &dyn CoachClient,
    ) -> Result<ChatTurn, ValidationError> {
        let pending = self.begin_chat_turn(text)?;
        let reply = coach.reply(&pending.request).await;
        Ok(self.finish_chat_turn(pending, reply))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
