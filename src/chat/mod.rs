//! Conversational answers: AI first, keyword responder otherwise.

pub mod fallback;
pub mod prompt;

use serde::{Deserialize, Serialize};

use crate::generation::{AiGenerationClient, CancellationToken};
use crate::models::PatientProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

/// One prior turn of the conversation, as sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
}

/// Answer `message`. Never fails: any generation error, including
/// cancellation, yields the offline answer.
pub async fn respond(
    ai: Option<&AiGenerationClient>,
    message: &str,
    history: &[ChatTurn],
    user_context: Option<&PatientProfile>,
    cancel: &CancellationToken,
) -> String {
    let Some(ai) = ai else {
        tracing::debug!("AI not configured, using offline chat responder");
        return fallback::respond(message).to_string();
    };

    let request = prompt::build_chat_request(message, history, user_context);
    match ai.generate_text(&request, cancel).await {
        Ok(text) => text,
        Err(e) => {
            tracing::info!(error = %e, "AI chat unavailable, using offline responder");
            fallback::respond(message).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{MockOutcome, MockTransport};
    use std::sync::Arc;
    use std::time::Duration;

    fn ai_with(mock: Arc<MockTransport>) -> AiGenerationClient {
        AiGenerationClient::new(
            mock,
            vec!["m1".into(), "m2".into(), "m3".into()],
            Duration::from_secs(1),
        )
    }

    #[test]
    fn turns_parse_with_role_aliases() {
        let turns: Vec<ChatTurn> = serde_json::from_value(serde_json::json!([
            { "role": "user", "content": "hi" },
            { "role": "assistant", "content": "hello" },
            { "role": "model", "content": "again" }
        ]))
        .unwrap();
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(turns[2].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn without_ai_uses_offline_answer() {
        let answer = respond(None, "I have cramps", &[], None, &CancellationToken::new()).await;
        assert_eq!(answer, fallback::respond("I have cramps"));
    }

    #[tokio::test]
    async fn ai_answer_is_returned() {
        let mock = Arc::new(MockTransport::new(vec![MockOutcome::Text(
            "This is a helpful response about menstrual health.".into(),
        )]));
        let ai = ai_with(mock.clone());

        let answer = respond(Some(&ai), "hello", &[], None, &CancellationToken::new()).await;
        assert_eq!(answer, "This is a helpful response about menstrual health.");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_ladder_uses_offline_answer() {
        let mock = Arc::new(MockTransport::always(MockOutcome::Status(503)));
        let ai = ai_with(mock.clone());

        let cancel = CancellationToken::new();
        let answer = respond(Some(&ai), "Tell me about nutrition", &[], None, &cancel).await;
        assert_eq!(answer, fallback::DEFAULT_RESPONSE);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn history_is_forwarded_upstream() {
        let mock = Arc::new(MockTransport::new(vec![MockOutcome::Text("ok".into())]));
        let ai = ai_with(mock.clone());
        let history = vec![
            ChatTurn { role: ChatRole::User, content: "Previous message".into() },
            ChatTurn { role: ChatRole::Assistant, content: "Previous response".into() },
        ];

        respond(Some(&ai), "Follow up", &history, None, &CancellationToken::new()).await;
        let calls = mock.calls();
        assert_eq!(calls[0].model, "m1");
        assert_eq!(calls[0].request.contents.len(), 5);
    }
}
