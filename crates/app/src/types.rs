//! Core type definitions for the Miro app.

use shared::wellness::{CommunityPost, Sentiment};

/// The panels reachable from the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Chat,
    Journal,
    Tips,
    Community,
    History,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Chat,
        View::Journal,
        View::Tips,
        View::Community,
        View::History,
    ];

    pub fn label_key(&self) -> &'static str {
        match self {
            View::Chat => "nav.chat",
            View::Journal => "nav.journal",
            View::Tips => "nav.tips",
            View::Community => "nav.community",
            View::History => "nav.history",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            View::Chat => "💬",
            View::Journal => "📔",
            View::Tips => "💡",
            View::Community => "👥",
            View::History => "🕘",
        }
    }
}

/// Answers from background AI requests, handed back to the UI thread.
#[derive(Debug)]
pub enum BackgroundResult {
    CrisisChecked {
        message: String,
        is_crisis: bool,
    },
    ChatReply {
        history_key: String,
        reply: String,
    },
    SmartReplies {
        anchor_id: String,
        language: String,
        replies: Vec<String>,
    },
    JournalClassified {
        content: String,
        sentiment: Sentiment,
    },
    /// Both halves of the Tips panel, fetched together when it opens.
    TipsLoaded {
        language: String,
        affirmation: String,
        tip: String,
    },
    Affirmation {
        language: String,
        text: String,
    },
    WellnessTip {
        language: String,
        text: String,
    },
    CommunityPosts {
        language: String,
        posts: Vec<CommunityPost>,
    },
}

/// Destructive actions that wait for a yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Chat panel: wipe the log and greet again.
    ClearChat,
    /// History panel: wipe the log, leaving it empty.
    ClearHistory,
    DeleteMessage(String),
}

impl ConfirmAction {
    pub fn prompt_key(&self) -> &'static str {
        match self {
            ConfirmAction::ClearChat | ConfirmAction::ClearHistory => "chat.clearHistory.confirm",
            ConfirmAction::DeleteMessage(_) => "chat.deleteMessage.confirm",
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatPanel {
    pub input: String,
    pub search: String,
    pub smart_replies: Vec<String>,
    /// Message id and language the current suggestions were requested for.
    pub suggestions_for: Option<(String, String)>,
    pub checking_crisis: bool,
    pub awaiting_reply: bool,
}

impl ChatPanel {
    pub fn is_busy(&self) -> bool {
        self.checking_crisis || self.awaiting_reply
    }
}

#[derive(Debug, Default)]
pub struct JournalPanel {
    pub draft: String,
    pub saving: bool,
}

#[derive(Debug, Default)]
pub struct TipsPanel {
    pub affirmation: Option<String>,
    pub tip: Option<String>,
    pub loading_affirmation: bool,
    pub loading_tip: bool,
    /// Language the shown content was fetched in.
    pub loaded_for: Option<String>,
}

#[derive(Debug, Default)]
pub struct CommunityPanel {
    pub posts: Vec<CommunityPost>,
    /// Language of the newest request still in flight.
    pub loading_for: Option<String>,
    pub loaded_for: Option<String>,
}

impl CommunityPanel {
    pub fn is_loading(&self) -> bool {
        self.loading_for.is_some()
    }
}
