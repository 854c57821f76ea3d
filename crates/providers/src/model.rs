use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shared::agent_api::ChatMessage;

/// One generation call: optional system instruction, the conversation, and
/// output constraints.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub messages: Vec<ChatMessage>,
    /// JSON schema the reply must follow. Implies a JSON response.
    pub response_schema: Option<Value>,
    pub json_response: bool,
    /// Reasoning token budget; `Some(0)` disables thinking.
    pub thinking_budget: Option<u32>,
}

impl GenerateRequest {
    /// A single user prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(text)],
            ..Default::default()
        }
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self.json_response = true;
        self
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }
}

#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String>;
}
