//! State management for the Miro app.
//!
//! `AppState` owns the persisted cells, the localizer, and the runtime that
//! AI requests run on. Requests are spawned onto the runtime and report back
//! over a channel that the UI drains once per frame, so the UI thread never
//! blocks on the network.

use crate::modals::{ConfirmDialog, EditProfileModal, EmergencyModal};
use crate::onboarding::ProfileForm;
use crate::types::*;
use anyhow::Result;
use chrono::{Local, Utc};
use companion::Companion;
use services::chat_history::{
    delete_message, history_key, migrate_history, suggestion_anchor, welcome_message,
};
use services::i18n::DEFAULT_LANGUAGE;
use services::journal::{append_entry, prune_expired};
use services::mood::record_mood;
use services::{Localizer, Persisted, Storage};
use shared::settings::AppSettings;
use shared::wellness::{JournalEntry, Message, Mood, MoodEntry, UserProfile};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

pub const PROFILE_KEY: &str = "userProfile";
pub const LANGUAGE_KEY: &str = "userLanguage";
pub const JOURNAL_KEY: &str = "journalEntries";
pub const MOODS_KEY: &str = "moodEntries";

/// How often the backing store is checked for writes by other processes.
const EXTERNAL_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct AppState {
    pub settings: AppSettings,
    pub storage: Arc<Storage>,
    pub profile: Persisted<Option<UserProfile>>,
    pub language: Persisted<String>,
    /// Log for the current profile; keyed by its name.
    pub chat_history: Persisted<Vec<Message>>,
    pub journal: Persisted<Vec<JournalEntry>>,
    pub moods: Persisted<Vec<MoodEntry>>,
    pub i18n: Localizer,
    pub companion: Companion,
    /// Why AI features are degraded, if they are.
    pub model_error: Option<String>,

    pub view: View,
    pub onboarding: ProfileForm,
    pub chat: ChatPanel,
    pub journal_panel: JournalPanel,
    pub tips: TipsPanel,
    pub community: CommunityPanel,
    pub emergency: EmergencyModal,
    pub edit_profile: EditProfileModal,
    pub confirm: ConfirmDialog,

    runtime: Runtime,
    tx: Sender<BackgroundResult>,
    rx: Receiver<BackgroundResult>,
    in_flight: usize,
    /// Old chat-history key to the key it was renamed to, so replies
    /// requested before a rename still find their log.
    renamed_histories: HashMap<String, String>,
    repaint: Option<egui::Context>,
    last_external_poll: Instant,
}

impl AppState {
    pub fn new(
        settings: AppSettings,
        storage: Arc<Storage>,
        companion: Companion,
        model_error: Option<String>,
        locales_dir: PathBuf,
    ) -> Result<Self> {
        let profile: Persisted<Option<UserProfile>> =
            Persisted::load(storage.handle(), PROFILE_KEY, None);
        let language = Persisted::load(storage.handle(), LANGUAGE_KEY, DEFAULT_LANGUAGE.to_string());
        let profile_name = profile.get().as_ref().map(|p| p.name.clone()).unwrap_or_default();
        let chat_history = Persisted::load(storage.handle(), history_key(&profile_name), Vec::new());
        let journal = Persisted::load(storage.handle(), JOURNAL_KEY, Vec::new());
        let moods = Persisted::load(storage.handle(), MOODS_KEY, Vec::new());
        let i18n = Localizer::new(language.get().clone(), locales_dir);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("miro-worker")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();

        let mut state = Self {
            settings,
            storage,
            profile,
            language,
            chat_history,
            journal,
            moods,
            i18n,
            companion,
            model_error,
            view: View::Chat,
            onboarding: ProfileForm::default(),
            chat: ChatPanel::default(),
            journal_panel: JournalPanel::default(),
            tips: TipsPanel::default(),
            community: CommunityPanel::default(),
            emergency: EmergencyModal::default(),
            edit_profile: EditProfileModal::default(),
            confirm: ConfirmDialog::default(),
            runtime,
            tx,
            rx,
            in_flight: 0,
            renamed_histories: HashMap::new(),
            repaint: None,
            last_external_poll: Instant::now(),
        };
        state.enter_view(View::Chat);
        Ok(state)
    }

    /// Lets finished background work wake the UI.
    pub fn attach_context(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    pub fn is_working(&self) -> bool {
        self.in_flight > 0
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile.get().as_ref().map(|p| p.name.as_str())
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = BackgroundResult> + Send + 'static,
    {
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = task.await;
            let _ = tx.send(result);
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    // ---- frame bookkeeping ----

    /// Apply every finished background result.
    pub fn poll_background(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.handle_result(result);
        }
    }

    /// Pick up writes made elsewhere: other handles every frame, other
    /// processes about once a second.
    pub fn sync_storage(&mut self) {
        if self.last_external_poll.elapsed() >= EXTERNAL_POLL_INTERVAL {
            self.last_external_poll = Instant::now();
            let changed = self.storage.poll_external();
            if changed > 0 {
                debug!(changed, "picked up external storage changes");
            }
        }

        if self.profile.sync() {
            let name = self.profile_name().unwrap_or_default().to_string();
            info!("profile changed elsewhere");
            self.chat_history.rekey(history_key(&name), Vec::new());
        }
        if self.language.sync() {
            let language = self.language.get().clone();
            self.i18n.set_language(language);
        }
        self.chat_history.sync();
        self.journal.sync();
        self.moods.sync();
    }

    // ---- navigation and profile ----

    /// Switch panels, running what each panel does when it opens.
    pub fn enter_view(&mut self, view: View) {
        self.view = view;
        match view {
            View::Chat => self.ensure_welcome(),
            View::Journal => self.prune_journal(),
            View::Tips => self.tips.loaded_for = None,
            View::Community => self.community.loaded_for = None,
            View::History => {}
        }
    }

    /// Seed an empty log with the greeting.
    pub fn ensure_welcome(&mut self) {
        let Some(name) = self.profile_name().map(str::to_string) else {
            return;
        };
        if self.chat_history.get().is_empty() {
            let text = self.i18n.t_with("chat.welcomeMessage", &[("name", name.as_str())]);
            self.chat_history.set(vec![welcome_message(text)]);
        }
    }

    pub fn complete_onboarding(&mut self, profile: UserProfile) {
        info!("profile created");
        let key = history_key(&profile.name);
        self.profile.set(Some(profile));
        self.chat_history.rekey(key, Vec::new());
        self.onboarding = ProfileForm::default();
        self.enter_view(View::Chat);
    }

    /// Replace the profile. A new name takes the chat log along with it.
    pub fn apply_profile_update(&mut self, updated: UserProfile) {
        let old_name = self.profile_name().unwrap_or_default().to_string();
        if old_name != updated.name {
            if let Err(e) = migrate_history(self.chat_history.handle(), &old_name, &updated.name) {
                error!("failed to migrate chat history: {}", e);
            }
            let new_key = history_key(&updated.name);
            self.renamed_histories.remove(&new_key);
            self.renamed_histories.insert(history_key(&old_name), new_key);
        }
        let key = history_key(&updated.name);
        self.profile.set(Some(updated));
        self.chat_history.rekey(key, Vec::new());
        self.chat.suggestions_for = None;
    }

    pub fn set_language(&mut self, full_name: &str) {
        if self.language.get() == full_name {
            return;
        }
        info!(language = full_name, "language changed");
        self.language.set(full_name.to_string());
        self.i18n.set_language(full_name);
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.settings.dark_mode = dark;
        crate::utils::save_settings(&self.settings);
    }

    // ---- chat ----

    /// Check `text` for crisis language; the message is only posted once the
    /// check comes back clear.
    pub fn send_message(&mut self, text: &str) {
        let message = text.trim().to_string();
        if message.is_empty() || self.chat.is_busy() || self.profile.get().is_none() {
            return;
        }
        self.chat.checking_crisis = true;
        self.chat.smart_replies.clear();
        let companion = self.companion.clone();
        self.spawn(async move {
            let is_crisis = companion.crisis_check(&message).await;
            BackgroundResult::CrisisChecked { message, is_crisis }
        });
    }

    fn post_message(&mut self, message: String) {
        let Some(profile) = self.profile.get().clone() else {
            return;
        };
        let history = self.chat_history.get().clone();
        self.chat_history.update(|log| {
            let mut next = log.clone();
            next.push(Message::user(message.clone()));
            next
        });
        if self.chat.input.trim() == message {
            self.chat.input.clear();
        }
        self.chat.awaiting_reply = true;

        let companion = self.companion.clone();
        let language = self.language.get().clone();
        let key = self.chat_history.key().to_string();
        self.spawn(async move {
            let reply = companion.chat_reply(&profile, &history, &message, &language).await;
            BackgroundResult::ChatReply {
                history_key: key,
                reply,
            }
        });
    }

    /// Request suggestions for the last AI message if they are not already
    /// showing or on their way.
    pub fn refresh_smart_replies(&mut self) {
        let language = self.language.get().clone();
        let anchor = suggestion_anchor(self.chat_history.get(), self.chat.is_busy())
            .map(|m| (m.id.clone(), m.text.clone()));
        let Some((anchor_id, anchor_text)) = anchor else {
            self.chat.smart_replies.clear();
            self.chat.suggestions_for = None;
            return;
        };
        let wanted = (anchor_id.clone(), language.clone());
        if self.chat.suggestions_for.as_ref() == Some(&wanted) {
            return;
        }
        self.chat.suggestions_for = Some(wanted);
        self.chat.smart_replies.clear();

        let companion = self.companion.clone();
        self.spawn(async move {
            let replies = companion.smart_replies(&anchor_text, &language).await;
            BackgroundResult::SmartReplies {
                anchor_id,
                language,
                replies,
            }
        });
    }

    pub fn confirm_action(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::ClearChat => {
                self.chat_history.set(Vec::new());
                self.chat.search.clear();
                self.ensure_welcome();
            }
            ConfirmAction::ClearHistory => self.chat_history.set(Vec::new()),
            ConfirmAction::DeleteMessage(id) => {
                let next = delete_message(self.chat_history.get(), &id);
                self.chat_history.set(next);
            }
        }
    }

    // ---- journal and mood ----

    pub fn prune_journal(&mut self) {
        if let Some(kept) = prune_expired(self.journal.get(), Utc::now()) {
            info!(
                removed = self.journal.get().len() - kept.len(),
                "pruned expired journal entries"
            );
            self.journal.set(kept);
        }
    }

    pub fn save_journal_entry(&mut self) {
        let content = self.journal_panel.draft.trim().to_string();
        if content.is_empty() || self.journal_panel.saving {
            return;
        }
        self.journal_panel.saving = true;
        let companion = self.companion.clone();
        self.spawn(async move {
            let sentiment = companion.journal_sentiment(&content).await;
            BackgroundResult::JournalClassified { content, sentiment }
        });
    }

    pub fn log_mood(&mut self, mood: Mood) {
        let today = Local::now().date_naive();
        let next = record_mood(self.moods.get(), today, mood);
        self.moods.set(next);
    }

    // ---- tips and community ----

    /// Fetch tip and affirmation unless they are current for the language.
    pub fn load_tips_if_needed(&mut self) {
        let language = self.language.get().clone();
        if self.tips.loaded_for.as_deref() == Some(language.as_str()) {
            return;
        }
        self.tips.loaded_for = Some(language.clone());
        self.tips.loading_affirmation = true;
        self.tips.loading_tip = true;
        let companion = self.companion.clone();
        self.spawn(async move {
            let (affirmation, tip) = futures::join!(
                companion.affirmation(&language),
                companion.wellness_tip(&language)
            );
            BackgroundResult::TipsLoaded {
                language,
                affirmation,
                tip,
            }
        });
    }

    pub fn refresh_affirmation(&mut self) {
        if self.tips.loading_affirmation {
            return;
        }
        self.tips.loading_affirmation = true;
        let language = self.language.get().clone();
        let companion = self.companion.clone();
        self.spawn(async move {
            let text = companion.affirmation(&language).await;
            BackgroundResult::Affirmation { language, text }
        });
    }

    pub fn refresh_tip(&mut self) {
        if self.tips.loading_tip {
            return;
        }
        self.tips.loading_tip = true;
        let language = self.language.get().clone();
        let companion = self.companion.clone();
        self.spawn(async move {
            let text = companion.wellness_tip(&language).await;
            BackgroundResult::WellnessTip { language, text }
        });
    }

    pub fn load_community_if_needed(&mut self) {
        let language = self.language.get().clone();
        if self.community.loaded_for.as_deref() == Some(language.as_str()) {
            return;
        }
        self.community.loaded_for = Some(language);
        self.refresh_community();
    }

    /// Request posts in the current language unless that request is
    /// already on its way. An older request in another language is left to
    /// finish and then ignored.
    pub fn refresh_community(&mut self) {
        let language = self.language.get().clone();
        if self.community.loading_for.as_deref() == Some(language.as_str()) {
            return;
        }
        self.community.loading_for = Some(language.clone());
        let companion = self.companion.clone();
        self.spawn(async move {
            let posts = companion.community_posts(&language).await;
            BackgroundResult::CommunityPosts { language, posts }
        });
    }

    // ---- results ----

    /// Follow renames from `key` to the key its log lives under now.
    fn current_history_key(&self, mut key: String) -> String {
        // The live key never has an entry, so chains always end.
        while let Some(next) = self.renamed_histories.get(&key) {
            key = next.clone();
        }
        key
    }

    fn handle_result(&mut self, result: BackgroundResult) {
        let language = self.language.get().clone();
        match result {
            BackgroundResult::CrisisChecked { message, is_crisis } => {
                self.chat.checking_crisis = false;
                if is_crisis {
                    warn!("crisis language detected; showing helplines");
                    self.emergency.open();
                } else {
                    self.post_message(message);
                }
            }
            BackgroundResult::ChatReply { history_key, reply } => {
                self.chat.awaiting_reply = false;
                let history_key = self.current_history_key(history_key);
                if history_key != self.chat_history.key() {
                    warn!(%history_key, "dropping reply for a log that is no longer shown");
                    return;
                }
                self.chat_history.update(|log| {
                    let mut next = log.clone();
                    next.push(Message::ai(reply));
                    next
                });
            }
            BackgroundResult::SmartReplies {
                anchor_id,
                language: requested,
                replies,
            } => {
                if self.chat.suggestions_for == Some((anchor_id, requested)) {
                    self.chat.smart_replies = replies;
                }
            }
            BackgroundResult::JournalClassified { content, sentiment } => {
                self.journal_panel.saving = false;
                if let Some(next) = append_entry(self.journal.get(), &content, sentiment, Utc::now()) {
                    self.journal.set(next);
                }
                self.journal_panel.draft.clear();
            }
            BackgroundResult::TipsLoaded {
                language: requested,
                affirmation,
                tip,
            } => {
                if requested == language {
                    self.tips.affirmation = Some(affirmation);
                    self.tips.tip = Some(tip);
                    self.tips.loading_affirmation = false;
                    self.tips.loading_tip = false;
                }
            }
            BackgroundResult::Affirmation {
                language: requested,
                text,
            } => {
                self.tips.loading_affirmation = false;
                if requested == language {
                    self.tips.affirmation = Some(text);
                }
            }
            BackgroundResult::WellnessTip {
                language: requested,
                text,
            } => {
                self.tips.loading_tip = false;
                if requested == language {
                    self.tips.tip = Some(text);
                }
            }
            BackgroundResult::CommunityPosts {
                language: requested,
                posts,
            } => {
                if self.community.loading_for.as_deref() == Some(requested.as_str()) {
                    self.community.loading_for = None;
                }
                if requested == language {
                    self.community.posts = posts;
                } else {
                    debug!(%requested, "ignoring community posts for a previous language");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use providers::{GenerateRequest, TextModel};
    use shared::wellness::Sentiment;
    use std::collections::VecDeque;

    /// Answers with queued strings; anything unqueued is an error.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn generate(&self, _request: GenerateRequest) -> anyhow::Result<String> {
            self.replies
                .lock()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted reply"))
        }
    }

    /// Answers community requests with one post named after the language
    /// the prompt asks for, whatever order the requests finish in.
    struct PostsByLanguage;

    #[async_trait]
    impl TextModel for PostsByLanguage {
        async fn generate(&self, request: GenerateRequest) -> anyhow::Result<String> {
            let prompt = &request.messages[0].content;
            let username = if prompt.contains("in Hindi") { "Hi" } else { "En" };
            Ok(format!(r#"[{{"username": "{username}", "content": "A small win."}}]"#))
        }
    }

    fn state_with(replies: &[&str]) -> (AppState, Arc<Storage>) {
        let model = ScriptedModel::default();
        model
            .replies
            .lock()
            .extend(replies.iter().map(|r| r.to_string()));
        state_with_model(Arc::new(model))
    }

    fn state_with_model(model: Arc<dyn TextModel>) -> (AppState, Arc<Storage>) {
        let storage = Storage::in_memory();
        let state = AppState::new(
            AppSettings::default(),
            storage.clone(),
            Companion::new(model),
            None,
            PathBuf::from("/nonexistent"),
        )
        .unwrap();
        (state, storage)
    }

    fn asha() -> UserProfile {
        UserProfile {
            name: "Asha".into(),
            age: 29,
            gender: "female".into(),
        }
    }

    /// Block until every spawned request has reported back.
    fn settle(state: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while state.is_working() && Instant::now() < deadline {
            match state.rx.recv_timeout(Duration::from_millis(50)) {
                Ok(result) => {
                    state.in_flight -= 1;
                    state.handle_result(result);
                }
                Err(_) => continue,
            }
        }
        assert!(!state.is_working(), "background work did not finish");
    }

    #[test]
    fn test_onboarding_seeds_welcome() {
        let (mut state, storage) = state_with(&[]);
        assert!(state.profile.get().is_none());
        assert!(state.chat_history.get().is_empty());

        state.complete_onboarding(asha());
        let log = state.chat_history.get();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, "initial-welcome");
        assert!(log[0].text.contains("Asha"));

        let stored = storage.handle().get_item("chatHistory_Asha").unwrap();
        assert!(stored.is_some());
    }

    #[test]
    fn test_send_posts_message_and_reply() {
        let (mut state, _storage) = state_with(&["false", "I'm here for you."]);
        state.complete_onboarding(asha());
        state.chat.input = "  rough day ".into();
        let input = state.chat.input.clone();
        state.send_message(&input);
        settle(&mut state);

        let log = state.chat_history.get();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].text, "rough day");
        assert!(log[2].is_from_ai());
        assert_eq!(log[2].text, "I'm here for you.");
        assert!(state.chat.input.is_empty());
        assert!(!state.chat.is_busy());
    }

    #[test]
    fn test_crisis_opens_helplines_and_holds_message() {
        let (mut state, _storage) = state_with(&["true"]);
        state.complete_onboarding(asha());
        state.chat.input = "I can't go on".into();
        state.send_message("I can't go on");
        settle(&mut state);

        assert!(crate::modals::Modal::is_open(&state.emergency));
        assert_eq!(state.chat_history.get().len(), 1);
        assert_eq!(state.chat.input, "I can't go on");
    }

    #[test]
    fn test_blank_message_is_ignored() {
        let (mut state, _storage) = state_with(&[]);
        state.complete_onboarding(asha());
        state.send_message("   ");
        assert!(!state.is_working());
        assert_eq!(state.chat_history.get().len(), 1);
    }

    #[test]
    fn test_rename_moves_history() {
        let (mut state, storage) = state_with(&[]);
        state.complete_onboarding(asha());
        let mut renamed = asha();
        renamed.name = "Asha R".into();
        state.apply_profile_update(renamed);

        assert_eq!(state.chat_history.key(), "chatHistory_Asha R");
        assert_eq!(state.chat_history.get().len(), 1);
        let handle = storage.handle();
        assert_eq!(handle.get_item("chatHistory_Asha").unwrap(), None);
    }

    #[test]
    fn test_clear_chat_and_clear_history_differ() {
        let (mut state, _storage) = state_with(&[]);
        state.complete_onboarding(asha());
        state.chat_history.set(vec![Message::user("one"), Message::ai("two")]);

        state.confirm_action(ConfirmAction::ClearChat);
        assert_eq!(state.chat_history.get().len(), 1);
        assert_eq!(state.chat_history.get()[0].id, "initial-welcome");

        state.confirm_action(ConfirmAction::ClearHistory);
        assert!(state.chat_history.get().is_empty());
    }

    #[test]
    fn test_delete_message() {
        let (mut state, _storage) = state_with(&[]);
        state.complete_onboarding(asha());
        let doomed = Message::user("delete me");
        let id = doomed.id.clone();
        state.chat_history.update(|log| {
            let mut next = log.clone();
            next.push(doomed);
            next
        });
        state.confirm_action(ConfirmAction::DeleteMessage(id));
        assert_eq!(state.chat_history.get().len(), 1);
    }

    #[test]
    fn test_journal_save_classifies_entry() {
        let (mut state, _storage) = state_with(&["negative"]);
        state.journal_panel.draft = " long week ".into();
        state.save_journal_entry();
        assert!(state.journal_panel.saving);
        settle(&mut state);

        let entries = state.journal.get();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "long week");
        assert_eq!(entries[0].sentiment, Sentiment::Negative);
        assert!(state.journal_panel.draft.is_empty());
        assert!(!state.journal_panel.saving);
    }

    #[test]
    fn test_log_mood_once_per_day() {
        let (mut state, _storage) = state_with(&[]);
        state.log_mood(Mood::Sad);
        state.log_mood(Mood::Happy);
        assert_eq!(state.moods.get().len(), 1);
        assert_eq!(state.moods.get()[0].mood, Mood::Happy);
    }

    #[test]
    fn test_tips_load_once_per_language() {
        let (mut state, _storage) = state_with(&["You are enough.", "Drink water."]);
        state.enter_view(View::Tips);
        state.load_tips_if_needed();
        state.load_tips_if_needed();
        settle(&mut state);
        assert_eq!(state.tips.affirmation.as_deref(), Some("You are enough."));
        assert_eq!(state.tips.tip.as_deref(), Some("Drink water."));
        assert!(!state.tips.loading_tip);
    }

    #[test]
    fn test_smart_replies_requested_once_per_anchor() {
        let (mut state, _storage) = state_with(&[r#"["Yes", "No", "Maybe", "Later"]"#]);
        state.complete_onboarding(asha());
        state.refresh_smart_replies();
        state.refresh_smart_replies();
        settle(&mut state);
        assert_eq!(state.chat.smart_replies, vec!["Yes", "No", "Maybe"]);
    }

    #[test]
    fn test_language_change_reaches_other_state() {
        let (mut state, storage) = state_with(&[]);
        let mut other: Persisted<String> =
            Persisted::load(storage.handle(), LANGUAGE_KEY, DEFAULT_LANGUAGE.to_string());
        other.set("Hindi".to_string());

        state.sync_storage();
        assert_eq!(state.language.get(), "Hindi");
        assert_eq!(state.i18n.language_full_name(), "Hindi");
    }

    #[test]
    fn test_community_refetches_after_language_change_mid_load() {
        let (mut state, _storage) = state_with_model(Arc::new(PostsByLanguage));
        state.enter_view(View::Community);
        state.load_community_if_needed();
        assert_eq!(state.community.loading_for.as_deref(), Some("English"));

        state.set_language("Hindi");
        state.load_community_if_needed();
        assert_eq!(state.community.loading_for.as_deref(), Some("Hindi"));
        settle(&mut state);

        assert_eq!(state.community.loaded_for.as_deref(), Some("Hindi"));
        assert!(!state.community.is_loading());
        let usernames: Vec<&str> = state.community.posts.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(usernames, vec!["Hi"]);
    }

    #[test]
    fn test_community_refresh_ignored_while_same_language_loads() {
        let (mut state, _storage) = state_with_model(Arc::new(PostsByLanguage));
        state.enter_view(View::Community);
        state.load_community_if_needed();
        state.refresh_community();
        assert_eq!(state.in_flight, 1);
        settle(&mut state);
        assert_eq!(state.community.posts.len(), 1);
        assert_eq!(state.community.posts[0].username, "En");
    }

    #[test]
    fn test_reply_follows_rename_while_pending() {
        let (mut state, storage) = state_with(&["false", "Take a slow breath."]);
        state.complete_onboarding(asha());
        state.send_message("rough day");
        // Crisis check comes back; the reply is now in flight.
        while state.chat.checking_crisis {
            let result = state.rx.recv_timeout(Duration::from_secs(5)).unwrap();
            state.in_flight -= 1;
            state.handle_result(result);
        }
        assert!(state.chat.awaiting_reply);

        let mut renamed = asha();
        renamed.name = "Asha R".into();
        state.apply_profile_update(renamed);
        settle(&mut state);

        let log = state.chat_history.get();
        assert_eq!(state.chat_history.key(), "chatHistory_Asha R");
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].text, "rough day");
        assert_eq!(log[2].text, "Take a slow breath.");
        assert_eq!(storage.handle().get_item("chatHistory_Asha").unwrap(), None);
    }
}
