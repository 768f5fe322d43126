use std::sync::{ Arc, Mutex, MutexGuard };
use crate::config::ButtonIcon;
use crate::models::chat::Sender;

/// The DOM handles a controller drives. Implementations own the actual
/// elements; the controller only issues these calls, in order.
pub trait WidgetView: Send {
    fn apply_theme(&mut self, variables: &[(&'static str, String)]);

    /// Places the floating toggle button and sets its image.
    fn apply_button(&mut self, position_class: &str, icon: &ButtonIcon);

    fn set_placeholder(&mut self, placeholder: &str);

    fn set_open(&mut self, open: bool);

    fn append_message(&mut self, sender: Sender, html: &str);

    fn clear_messages(&mut self);

    fn show_typing(&mut self);

    fn remove_typing(&mut self);

    fn set_input_enabled(&mut self, enabled: bool);

    fn clear_input(&mut self);

    fn focus_input(&mut self);

    fn scroll_to_bottom(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ThemeApplied(Vec<(String, String)>),
    ButtonApplied(String, ButtonIcon),
    Placeholder(String),
    Opened,
    Closed,
    Appended(Sender, String),
    MessagesCleared,
    TypingShown,
    TypingRemoved,
    InputEnabled(bool),
    InputCleared,
    Focused,
}

/// What a page would currently show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub open: bool,
    pub messages: Vec<(Sender, String)>,
    pub typing: bool,
    pub input_enabled: bool,
    pub placeholder: String,
    pub position_class: String,
    pub icon: Option<ButtonIcon>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    snapshot: ViewSnapshot,
    events: Vec<ViewEvent>,
}

/// A view with no document behind it. Clones share state, so a host can
/// hand one clone to the controller and inspect the other.
#[derive(Debug, Clone)]
pub struct HeadlessView {
    state: Arc<Mutex<HeadlessState>>,
}

impl Default for HeadlessView {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessView {
    pub fn new() -> Self {
        let state = HeadlessState {
            snapshot: ViewSnapshot { input_enabled: true, ..ViewSnapshot::default() },
            events: Vec::new(),
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.lock().snapshot.clone()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.lock().events.clone()
    }

    fn record(&self, event: ViewEvent, apply: impl FnOnce(&mut ViewSnapshot)) {
        let mut state = self.lock();
        apply(&mut state.snapshot);
        state.events.push(event);
    }
}

impl WidgetView for HeadlessView {
    fn apply_theme(&mut self, variables: &[(&'static str, String)]) {
        let owned = variables
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        self.record(ViewEvent::ThemeApplied(owned), |_| {});
    }

    fn apply_button(&mut self, position_class: &str, icon: &ButtonIcon) {
        self.record(ViewEvent::ButtonApplied(position_class.to_string(), icon.clone()), |s| {
            s.position_class = position_class.to_string();
            s.icon = Some(icon.clone());
        });
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        self.record(ViewEvent::Placeholder(placeholder.to_string()), |s| {
            s.placeholder = placeholder.to_string();
        });
    }

    fn set_open(&mut self, open: bool) {
        let event = if open { ViewEvent::Opened } else { ViewEvent::Closed };
        self.record(event, |s| {
            s.open = open;
        });
    }

    fn append_message(&mut self, sender: Sender, html: &str) {
        self.record(ViewEvent::Appended(sender, html.to_string()), |s| {
            s.messages.push((sender, html.to_string()));
        });
    }

    fn clear_messages(&mut self) {
        self.record(ViewEvent::MessagesCleared, |s| {
            s.messages.clear();
            s.typing = false;
        });
    }

    fn show_typing(&mut self) {
        self.record(ViewEvent::TypingShown, |s| {
            s.typing = true;
        });
    }

    fn remove_typing(&mut self) {
        self.record(ViewEvent::TypingRemoved, |s| {
            s.typing = false;
        });
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.record(ViewEvent::InputEnabled(enabled), |s| {
            s.input_enabled = enabled;
        });
    }

    fn clear_input(&mut self) {
        self.record(ViewEvent::InputCleared, |_| {});
    }

    fn focus_input(&mut self) {
        self.record(ViewEvent::Focused, |_| {});
    }
}
