pub mod events;
pub mod wellness;

pub mod settings {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelProvider {
        pub gemini_model: String, // e.g., "gemini-2.5-flash"
        #[serde(default)]
        pub gemini_auth: ProviderAuth,
    }

    impl Default for ModelProvider {
        fn default() -> Self {
            Self {
                gemini_model: "gemini-2.5-flash".into(),
                gemini_auth: ProviderAuth::default(),
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub model: ModelProvider,
        #[serde(default)]
        pub dark_mode: bool,
        /// Where the key-value storage lives. `None` means the platform data dir.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub data_dir: Option<String>,
        /// Directory holding `<code>.json` translation files.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub locales_dir: Option<String>,
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: "user".to_string(),
                content: content.into(),
            }
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self {
                role: "assistant".to_string(),
                content: content.into(),
            }
        }
    }
}
