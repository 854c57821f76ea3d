//! Companion - the AI side of Miro.
//!
//! Every capability builds a prompt, asks the configured [`TextModel`], and
//! validates the answer. Failures never reach the caller: they are logged
//! and a fixed fallback is returned instead.

pub mod prompts;

use anyhow::{anyhow, Result};
use providers::{GenerateRequest, TextModel};
use serde_json::Value;
use shared::agent_api::ChatMessage;
use shared::wellness::{CommunityPost, Message, Sender, Sentiment, UserProfile};
use std::sync::Arc;
use tracing::{debug, error, warn};

use prompts::*;

/// How many earlier messages are sent along with a chat turn.
pub const HISTORY_WINDOW: usize = 20;

#[derive(Clone)]
pub struct Companion {
    model: Arc<dyn TextModel>,
}

impl Companion {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Reply to `message` in the voice of Miro.
    pub async fn chat_reply(
        &self,
        profile: &UserProfile,
        history: &[Message],
        message: &str,
        language: &str,
    ) -> String {
        let mut messages = history_turns(history);
        messages.push(ChatMessage::user(message));
        let request = GenerateRequest {
            messages,
            ..Default::default()
        }
        .with_system(system_instruction(profile, language));

        match self.text(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error getting chat response: {:#}", e);
                CHAT_FALLBACK.to_string()
            }
        }
    }

    /// Up to three follow-up phrases the user might tap.
    pub async fn smart_replies(&self, last_ai_message: &str, language: &str) -> Vec<String> {
        let request = GenerateRequest::prompt(smart_replies_prompt(last_ai_message, language))
            .with_schema(string_array_schema());

        match self.json(request).await {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .take(3)
                .collect(),
            Ok(other) => {
                warn!("smart replies were not an array: {}", other);
                Vec::new()
            }
            Err(e) => {
                error!("Error getting smart replies: {:#}", e);
                SMART_REPLY_FALLBACK.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Classify a journal entry. Anything unclear counts as negative.
    pub async fn journal_sentiment(&self, text: &str) -> Sentiment {
        match self.text(GenerateRequest::prompt(sentiment_prompt(text))).await {
            Ok(answer) => Sentiment::parse(&answer).unwrap_or_else(|| {
                debug!(answer = %answer, "unexpected sentiment answer");
                Sentiment::Negative
            }),
            Err(e) => {
                error!("Error getting journal sentiment: {:#}", e);
                Sentiment::Negative
            }
        }
    }

    /// Whether a message signals self-harm or an immediate crisis.
    /// Errors never raise an alarm.
    pub async fn crisis_check(&self, message: &str) -> bool {
        let request = GenerateRequest::prompt(crisis_prompt(message)).with_thinking_budget(0);
        match self.text(request).await {
            Ok(answer) => answer.trim().eq_ignore_ascii_case("true"),
            Err(e) => {
                error!("Error checking for crisis: {:#}", e);
                false
            }
        }
    }

    pub async fn wellness_tip(&self, language: &str) -> String {
        match self.text(GenerateRequest::prompt(tip_prompt(language))).await {
            Ok(tip) => tip,
            Err(e) => {
                error!("Error getting wellness tip: {:#}", e);
                TIP_FALLBACK.to_string()
            }
        }
    }

    pub async fn affirmation(&self, language: &str) -> String {
        match self.text(GenerateRequest::prompt(affirmation_prompt(language))).await {
            Ok(text) => text,
            Err(e) => {
                error!("Error getting affirmation: {:#}", e);
                AFFIRMATION_FALLBACK.to_string()
            }
        }
    }

    pub async fn community_posts(&self, language: &str) -> Vec<CommunityPost> {
        let request =
            GenerateRequest::prompt(community_prompt(language)).with_schema(community_schema());

        match self.json(request).await {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<CommunityPost>(item) {
                    Ok(post) => Some(post),
                    Err(e) => {
                        warn!("skipping malformed community post: {}", e);
                        None
                    }
                })
                .collect(),
            Ok(other) => {
                warn!("community posts were not an array: {}", other);
                Vec::new()
            }
            Err(e) => {
                error!("Error getting community posts: {:#}", e);
                community_fallback()
            }
        }
    }

    /// Non-empty trimmed text from the model.
    async fn text(&self, request: GenerateRequest) -> Result<String> {
        let reply = self.model.generate(request).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(anyhow!("model returned an empty reply"));
        }
        Ok(reply.to_string())
    }

    async fn json(&self, request: GenerateRequest) -> Result<Value> {
        let reply = self.text(request).await?;
        Ok(serde_json::from_str(strip_code_fence(&reply))?)
    }
}

/// Recent history as provider turns. The conversation must open with the
/// user, so leading AI messages (like the welcome greeting) are dropped.
fn history_turns(history: &[Message]) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .skip_while(|m| m.sender == Sender::Ai)
        .map(|m| match m.sender {
            Sender::User => ChatMessage::user(m.text.clone()),
            Sender::Ai => ChatMessage::assistant(m.text.clone()),
        })
        .collect()
}

/// Models sometimes wrap JSON in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays canned replies and records every request.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedModel {
        fn replying(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn generate(&self, request: GenerateRequest) -> Result<String> {
            self.requests.lock().push(request);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no scripted reply")))
        }
    }

    fn ok(text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Asha".into(),
            age: 29,
            gender: "female".into(),
        }
    }

    #[tokio::test]
    async fn test_chat_reply_sends_persona_and_history() {
        let model = ScriptedModel::replying(vec![ok("  That sounds tough.  ")]);
        let companion = Companion::new(model.clone());
        let history = vec![
            Message::ai("Hi Asha, how are you feeling today?"),
            Message::user("Not great"),
            Message::ai("I'm here for you."),
        ];

        let reply = companion
            .chat_reply(&profile(), &history, "Work was awful", "English")
            .await;
        assert_eq!(reply, "That sounds tough.");

        let requests = model.requests.lock();
        let sent = &requests[0];
        assert!(sent
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("respond ONLY in English"));
        let roles: Vec<&str> = sent.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(sent.messages[2].content, "Work was awful");
    }

    #[tokio::test]
    async fn test_chat_reply_falls_back_on_error_or_empty() {
        let model = ScriptedModel::replying(vec![Err(anyhow!("503")), ok("   ")]);
        let companion = Companion::new(model);
        assert_eq!(
            companion.chat_reply(&profile(), &[], "hi", "English").await,
            CHAT_FALLBACK
        );
        assert_eq!(
            companion.chat_reply(&profile(), &[], "hi", "English").await,
            CHAT_FALLBACK
        );
    }

    #[tokio::test]
    async fn test_smart_replies_parsing() {
        let model = ScriptedModel::replying(vec![
            ok(r#"["Tell me more", "Breathing?", "Thanks", "Extra"]"#),
            ok("```json\n[\"One\"]\n```"),
            ok(r#"{"replies": []}"#),
            ok("not json"),
        ]);
        let companion = Companion::new(model.clone());

        assert_eq!(
            companion.smart_replies("How was today?", "English").await,
            vec!["Tell me more", "Breathing?", "Thanks"]
        );
        assert_eq!(companion.smart_replies("x", "English").await, vec!["One"]);
        assert!(companion.smart_replies("x", "English").await.is_empty());
        assert_eq!(
            companion.smart_replies("x", "English").await,
            SMART_REPLY_FALLBACK.to_vec()
        );

        let requests = model.requests.lock();
        assert!(requests[0].json_response);
        assert!(requests[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn test_journal_sentiment() {
        let model = ScriptedModel::replying(vec![
            ok("Positive\n"),
            ok("negative"),
            ok("mixed"),
            Err(anyhow!("offline")),
        ]);
        let companion = Companion::new(model);
        assert_eq!(companion.journal_sentiment("a").await, Sentiment::Positive);
        assert_eq!(companion.journal_sentiment("b").await, Sentiment::Negative);
        assert_eq!(companion.journal_sentiment("c").await, Sentiment::Negative);
        assert_eq!(companion.journal_sentiment("d").await, Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_crisis_check() {
        let model = ScriptedModel::replying(vec![ok(" TRUE "), ok("false"), Err(anyhow!("x"))]);
        let companion = Companion::new(model.clone());
        assert!(companion.crisis_check("...").await);
        assert!(!companion.crisis_check("...").await);
        assert!(!companion.crisis_check("...").await);
        assert_eq!(model.requests.lock()[0].thinking_budget, Some(0));
    }

    #[tokio::test]
    async fn test_tip_and_affirmation_fallbacks() {
        let model = ScriptedModel::replying(vec![
            ok("Take a short walk."),
            Err(anyhow!("x")),
            ok("I am enough."),
            ok(""),
        ]);
        let companion = Companion::new(model);
        assert_eq!(companion.wellness_tip("English").await, "Take a short walk.");
        assert_eq!(companion.wellness_tip("English").await, TIP_FALLBACK);
        assert_eq!(companion.affirmation("English").await, "I am enough.");
        assert_eq!(companion.affirmation("English").await, AFFIRMATION_FALLBACK);
    }

    #[tokio::test]
    async fn test_community_posts() {
        let model = ScriptedModel::replying(vec![
            ok(r#"[{"username":"HopefulSoul","content":"Walked today."},{"oops":1}]"#),
            ok(r#""just text""#),
            Err(anyhow!("x")),
        ]);
        let companion = Companion::new(model);

        let posts = companion.community_posts("English").await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].username, "HopefulSoul");

        assert!(companion.community_posts("English").await.is_empty());
        assert_eq!(companion.community_posts("English").await, community_fallback());
    }

    #[test]
    fn test_history_turns_window_and_leading_ai() {
        let mut history = vec![Message::ai("welcome")];
        for i in 0..30 {
            history.push(Message::user(format!("u{i}")));
            history.push(Message::ai(format!("a{i}")));
        }
        let turns = history_turns(&history);
        assert!(turns.len() <= HISTORY_WINDOW);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns.last().unwrap().content, "a29");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[2]```"), "[2]");
        assert_eq!(strip_code_fence(" [3] "), "[3]");
    }
}
