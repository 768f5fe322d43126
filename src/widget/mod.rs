pub mod state;
pub mod view;

use futures::future::BoxFuture;
use log::{ debug, error, info, warn };
use std::sync::Arc;
use uuid::Uuid;
use crate::api::{ ApiError, ChatTransport };
use crate::config::WidgetConfig;
use crate::config::theme::{ css_variables, position_class };
use crate::format::Formatter;
use crate::history::{ HistoryStore, OpenStateStore, SessionStorage };
use crate::models::api::ChatReply;
use crate::models::chat::{ ConversationHistory, Message };
use self::state::{ WidgetPhase, WidgetUIState };
use self::view::WidgetView;

/// Inputs a host forwards from its event listeners.
#[derive(Debug)]
pub enum WidgetEvent {
    Toggle,
    Open,
    Close,
    Submit(String),
    Reply(Result<ChatReply, ApiError>),
    ClearHistory,
}

/// A user message that was accepted and echoed and now waits for the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    text: String,
}

impl PendingSend {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Owns one widget instance: its view, its UI state and its conversation.
pub struct WidgetController {
    id: Uuid,
    config: Arc<WidgetConfig>,
    view: Box<dyn WidgetView>,
    transport: Arc<dyn ChatTransport>,
    formatter: Formatter,
    history_store: HistoryStore,
    open_state: Option<OpenStateStore>,
    history: ConversationHistory,
    ui: WidgetUIState,
    seeded: bool,
}

impl WidgetController {
    pub fn new(
        config: WidgetConfig,
        view: Box<dyn WidgetView>,
        transport: Arc<dyn ChatTransport>,
        session: Arc<dyn SessionStorage>,
        formatter: Formatter
    ) -> Self {
        let history_store = HistoryStore::new(session, &config.site_id, formatter.clone());
        Self {
            id: Uuid::new_v4(),
            config: Arc::new(config),
            view,
            transport,
            formatter,
            history_store,
            open_state: None,
            history: ConversationHistory::new(),
            ui: WidgetUIState::default(),
            seeded: false,
        }
    }

    /// Remembers the open/closed state in longer-lived storage.
    pub fn with_open_state(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.open_state = Some(OpenStateStore::new(storage, &self.config.site_id));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn ui_state(&self) -> WidgetUIState {
        self.ui
    }

    pub fn phase(&self) -> WidgetPhase {
        self.ui.phase()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn init(&mut self) {
        info!(
            "Widget {} for site '{}' using {} sanitizer",
            self.id,
            self.config.site_id,
            self.formatter.sanitizer_name()
        );
        self.view.apply_theme(&css_variables(&self.config));
        self.view.apply_button(&position_class(&self.config), &self.config.button_icon());
        self.view.set_placeholder(self.config.placeholder());

        let was_open = self.open_state.as_ref().and_then(|prefs| prefs.load());
        if was_open == Some(true) {
            self.open();
        }
    }

    pub fn handle(&mut self, event: WidgetEvent) -> Option<PendingSend> {
        match event {
            WidgetEvent::Toggle => self.toggle(),
            WidgetEvent::Open => self.open(),
            WidgetEvent::Close => self.close(),
            WidgetEvent::Submit(input) => {
                return self.submit(&input);
            }
            WidgetEvent::Reply(result) => self.complete(result),
            WidgetEvent::ClearHistory => self.clear_history(),
        }
        None
    }

    pub fn toggle(&mut self) {
        if self.ui.is_open {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn open(&mut self) {
        if self.ui.is_open {
            return;
        }
        if !self.seeded {
            self.restore_or_welcome();
            self.seeded = true;
        }
        self.ui.is_open = true;
        self.view.set_open(true);
        self.view.scroll_to_bottom();
        self.view.focus_input();
        if let Some(prefs) = &self.open_state {
            prefs.save(true);
        }
        debug!("Widget {} opened ({})", self.id, self.phase());
    }

    pub fn close(&mut self) {
        if !self.ui.is_open {
            return;
        }
        self.ui.is_open = false;
        self.view.set_open(false);
        if let Some(prefs) = &self.open_state {
            prefs.save(false);
        }
        debug!("Widget {} closed", self.id);
    }

    /// Accepts a visitor message. Returns the request to send, or `None`
    /// when the input is blank, the window is closed, or a reply is still
    /// pending.
    pub fn submit(&mut self, input: &str) -> Option<PendingSend> {
        if !self.ui.is_open {
            debug!("Widget {} ignored submit while closed", self.id);
            return None;
        }
        if self.ui.is_loading {
            debug!("Widget {} ignored submit while a reply is pending", self.id);
            return None;
        }
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        self.view.clear_input();
        self.append(Message::user(text));

        self.ui.is_loading = true;
        self.view.set_input_enabled(false);
        self.view.show_typing();
        self.view.scroll_to_bottom();
        Some(PendingSend { text: text.to_string() })
    }

    /// The network half of a send, detached from the controller so a host
    /// can run it while it keeps handling events.
    pub fn dispatch(&self, pending: PendingSend) -> BoxFuture<'static, Result<ChatReply, ApiError>> {
        let transport = Arc::clone(&self.transport);
        let config = Arc::clone(&self.config);
        Box::pin(async move { transport.send(&pending.text, &config).await })
    }

    pub fn complete(&mut self, result: Result<ChatReply, ApiError>) {
        if !self.ui.is_loading {
            warn!("Widget {} got a reply with no request pending; dropped", self.id);
            return;
        }

        self.view.remove_typing();
        let message = match result {
            Ok(reply) => Message::bot(self.formatter.render(&reply.reply)),
            Err(e) => {
                error!("Widget {} failed to reach the chat API: {}", self.id, e);
                Message::bot(self.formatter.render(self.config.error_text()))
            }
        };
        self.append(message);

        self.ui.is_loading = false;
        self.view.set_input_enabled(true);
        self.view.set_placeholder(self.config.placeholder());
        self.view.focus_input();
        self.history_store.save(&self.history);
    }

    /// Submit, wait for the backend, and render the outcome. Returns whether
    /// a request was made.
    pub async fn send(&mut self, input: &str) -> bool {
        let Some(pending) = self.submit(input) else {
            return false;
        };
        let result = self.dispatch(pending).await;
        self.complete(result);
        true
    }

    /// Ignored while a reply is pending.
    pub fn clear_history(&mut self) {
        if self.ui.is_loading {
            debug!("Widget {} ignored clear while a reply is pending", self.id);
            return;
        }
        self.history_store.clear();
        self.history.clear();
        self.view.clear_messages();
        self.show_welcome();
        self.seeded = true;
        info!("Widget {} history cleared", self.id);
    }

    fn restore_or_welcome(&mut self) {
        let restored = self.history_store.load();
        if restored.is_empty() {
            self.show_welcome();
            return;
        }

        info!("Widget {} restored {} message(s)", self.id, restored.len());
        for message in restored.messages() {
            self.view.append_message(message.sender, &message.html());
        }
        self.history = restored;
        self.view.scroll_to_bottom();
    }

    fn show_welcome(&mut self) {
        let welcome = self.formatter.render(self.config.welcome_text());
        self.append(Message::bot(welcome));
        self.history_store.save(&self.history);
    }

    fn append(&mut self, message: Message) {
        self.view.append_message(message.sender, &message.html());
        self.history.push(message);
        self.view.scroll_to_bottom();
    }
}
