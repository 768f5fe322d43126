use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetUIState {
    pub is_open: bool,
    pub is_loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    Closed,
    OpenIdle,
    OpenSending,
}

impl WidgetUIState {
    /// A window closed mid-request reports `Closed`; `is_loading` still
    /// guards submissions until the reply lands.
    pub fn phase(&self) -> WidgetPhase {
        match (self.is_open, self.is_loading) {
            (false, _) => WidgetPhase::Closed,
            (true, false) => WidgetPhase::OpenIdle,
            (true, true) => WidgetPhase::OpenSending,
        }
    }
}

impl fmt::Display for WidgetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetPhase::Closed => write!(f, "closed"),
            WidgetPhase::OpenIdle => write!(f, "open-idle"),
            WidgetPhase::OpenSending => write!(f, "open-sending"),
        }
    }
}
