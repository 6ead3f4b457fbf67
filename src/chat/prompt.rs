use super::{ChatRole, ChatTurn};
use crate::generation::sanitize::{sanitize_user_text, MAX_MESSAGE_CHARS};
use crate::generation::{Content, GenerateContentRequest, Role, CHAT_GENERATION};
use crate::models::PatientProfile;

/// Prior turns forwarded upstream, most recent kept.
pub const MAX_HISTORY_TURNS: usize = 20;

pub const CHAT_SYSTEM_PROMPT: &str = r#"You are CycleCare, a supportive assistant for menstrual health questions. You are NOT a doctor.

RULES:
1. Give clear, evidence-based general information in plain, warm language.
2. NEVER diagnose or prescribe. Describe what symptoms can be associated with, not what the user has.
3. Encourage the user to see a healthcare provider for severe, worsening, or unusual symptoms, and urgently for fainting, fever, or very heavy bleeding.
4. Keep answers short: a few sentences or a brief list.
5. When the user context below is relevant, use it; otherwise ignore it."#;

/// Model turn acknowledging the system context, so the conversation
/// alternates user/model from the start.
pub const CONTEXT_ACKNOWLEDGEMENT: &str = "Understood. I will offer supportive, general menstrual health information, avoid diagnosing, and suggest seeing a healthcare provider when symptoms call for it.";

/// Build the chat request: system context, acknowledgement, prior turns,
/// then the current message.
pub fn build_chat_request(
    message: &str,
    history: &[ChatTurn],
    user_context: Option<&PatientProfile>,
) -> GenerateContentRequest {
    let mut contents = vec![
        Content::user(system_context(user_context)),
        Content::model(CONTEXT_ACKNOWLEDGEMENT),
    ];

    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
    for turn in history.iter().skip(skip) {
        let text = sanitize_user_text(&turn.content, MAX_MESSAGE_CHARS);
        if text.is_empty() {
            continue;
        }
        let role = match turn.role {
            ChatRole::User => Role::User,
            ChatRole::Assistant => Role::Model,
        };
        contents.push(Content::text(role, text));
    }

    contents.push(Content::user(sanitize_user_text(message, MAX_MESSAGE_CHARS)));

    GenerateContentRequest {
        contents,
        generation_config: CHAT_GENERATION,
    }
}

fn system_context(user_context: Option<&PatientProfile>) -> String {
    let mut text = String::from(CHAT_SYSTEM_PROMPT);
    let Some(profile) = user_context else {
        return text;
    };

    let mut lines = String::new();
    if let Some(name) = profile.name() {
        lines.push_str(&format!("- Name: {name}\n"));
    }
    if let Some(age) = profile.age_range() {
        lines.push_str(&format!("- Age range: {age}\n"));
    }
    let conditions: Vec<&str> = profile.named_conditions().collect();
    if !conditions.is_empty() {
        lines.push_str(&format!("- Known conditions: {}\n", conditions.join(", ")));
    }
    if let Some(days) = profile.cycle_length() {
        lines.push_str(&format!("- Average cycle length: {days} days\n"));
    }

    if !lines.is_empty() {
        text.push_str("\n\nUSER CONTEXT:\n");
        text.push_str(lines.trim_end());
    }
    text
}
