pub mod theme;

use log::{ info, warn };
use serde::{ Deserialize, Deserializer, Serialize };
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SITE_ID: &str = "sitio_demo";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/chat";
pub const DEFAULT_WELCOME_MESSAGE: &str = "¡Hola! 👋 ¿En qué puedo ayudarte?";
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, something went wrong. Please try again.";
pub const DEFAULT_INPUT_PLACEHOLDER: &str = "Type your message...";
pub const DEFAULT_PRIMARY_COLOR: &str = "#0066CC";
pub const DEFAULT_SECONDARY_COLOR: &str = "#F0F4F8";
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";
pub const DEFAULT_BOT_TEXT_COLOR: &str = "#1f2937";
pub const DEFAULT_USER_TEXT_COLOR: &str = "#FFFFFF";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse widget config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseOptionError {
    message: String,
}

impl fmt::Display for ParseOptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseOptionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ButtonPosition {
    #[default]
    BottomRight,
    BottomLeft,
}

impl ButtonPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonPosition::BottomRight => "bottom-right",
            ButtonPosition::BottomLeft => "bottom-left",
        }
    }
}

impl FromStr for ButtonPosition {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bottom-right" => Ok(ButtonPosition::BottomRight),
            "bottom-left" => Ok(ButtonPosition::BottomLeft),
            _ => Err(ParseOptionError { message: format!("Invalid button position: '{}'", s) }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonIconType {
    #[default]
    Default,
    Custom,
}

impl FromStr for ButtonIconType {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(ButtonIconType::Default),
            "custom" => Ok(ButtonIconType::Custom),
            _ => Err(ParseOptionError { message: format!("Invalid button icon type: '{}'", s) }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ButtonSize {
    pub fn px(&self) -> u32 {
        match self {
            ButtonSize::Small => 50,
            ButtonSize::Medium => 60,
            ButtonSize::Large => 70,
        }
    }

    fn from_px(px: u64) -> Option<Self> {
        match px {
            50 => Some(ButtonSize::Small),
            60 => Some(ButtonSize::Medium),
            70 => Some(ButtonSize::Large),
            _ => None,
        }
    }
}

impl FromStr for ButtonSize {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "small" => Ok(ButtonSize::Small),
            "medium" => Ok(ButtonSize::Medium),
            "large" => Ok(ButtonSize::Large),
            _ => s
                .trim_end_matches("px")
                .parse::<u64>()
                .ok()
                .and_then(ButtonSize::from_px)
                .ok_or_else(|| ParseOptionError { message: format!("Invalid button size: '{}'", s) }),
        }
    }
}

/// Which image the floating toggle button shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonIcon {
    Default,
    Custom(String),
}

/// Widget settings as resolved by the hosting CMS. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub site_id: String,
    pub api_url: String,
    pub api_key: String,
    pub welcome_message: String,
    pub error_message: String,
    pub input_placeholder: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub text_color: String,
    pub bot_text_color: String,
    pub user_text_color: String,
    #[serde(deserialize_with = "lenient")]
    pub button_position: ButtonPosition,
    #[serde(deserialize_with = "lenient")]
    pub button_icon_type: ButtonIconType,
    pub button_icon_image: String,
    #[serde(deserialize_with = "lenient")]
    pub button_size: ButtonSize,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            site_id: DEFAULT_SITE_ID.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            input_placeholder: DEFAULT_INPUT_PLACEHOLDER.to_string(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            bot_text_color: DEFAULT_BOT_TEXT_COLOR.to_string(),
            user_text_color: DEFAULT_USER_TEXT_COLOR.to_string(),
            button_position: ButtonPosition::default(),
            button_icon_type: ButtonIconType::default(),
            button_icon_image: String::new(),
            button_size: ButtonSize::default(),
        }
    }
}

/// Accepts strings or numbers and falls back to the default for values the
/// settings layer should never have let through.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where D: Deserializer<'de>, T: FromStr + Default, T::Err: fmt::Display
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let raw = match &value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => return Ok(T::default()),
        other => other.to_string(),
    };
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(
        raw.parse::<T>().unwrap_or_else(|e| {
            warn!("{}; using default", e);
            T::default()
        })
    )
}

fn fill_blank(field: &mut String, default: &str) {
    if field.trim().is_empty() {
        *field = default.to_string();
    }
}

fn fill_invalid_color(field: &mut String, default: &str) {
    if !theme::is_hex_color(field) {
        if !field.trim().is_empty() {
            warn!("Invalid color '{}'; using {}", field, default);
        }
        *field = default.to_string();
    }
}

impl WidgetConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: WidgetConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        info!("Loaded widget config for site '{}' from {}", config.site_id, path.display());
        Ok(config)
    }

    /// Blank text falls back to the built-in defaults; malformed colors
    /// fall back to the default palette.
    pub fn normalized(mut self) -> Self {
        fill_blank(&mut self.site_id, DEFAULT_SITE_ID);
        fill_blank(&mut self.api_url, DEFAULT_API_URL);
        fill_blank(&mut self.welcome_message, DEFAULT_WELCOME_MESSAGE);
        fill_blank(&mut self.error_message, DEFAULT_ERROR_MESSAGE);
        fill_blank(&mut self.input_placeholder, DEFAULT_INPUT_PLACEHOLDER);
        fill_invalid_color(&mut self.primary_color, DEFAULT_PRIMARY_COLOR);
        fill_invalid_color(&mut self.secondary_color, DEFAULT_SECONDARY_COLOR);
        fill_invalid_color(&mut self.text_color, DEFAULT_TEXT_COLOR);
        fill_invalid_color(&mut self.bot_text_color, DEFAULT_BOT_TEXT_COLOR);
        fill_invalid_color(&mut self.user_text_color, DEFAULT_USER_TEXT_COLOR);
        self.api_key = self.api_key.trim().to_string();
        self
    }

    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        api_key: Option<String>,
        site_id: Option<String>
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(key) = api_key {
            self.api_key = key;
        }
        if let Some(site) = site_id {
            self.site_id = site;
        }
        self.normalized()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme =>
                Err(ConfigError::InvalidApiUrl {
                    url: self.api_url.clone(),
                    reason: format!("unsupported scheme '{}'", scheme),
                }),
        }
    }

    pub fn error_text(&self) -> &str {
        if self.error_message.trim().is_empty() {
            DEFAULT_ERROR_MESSAGE
        } else {
            &self.error_message
        }
    }

    pub fn welcome_text(&self) -> &str {
        if self.welcome_message.trim().is_empty() {
            DEFAULT_WELCOME_MESSAGE
        } else {
            &self.welcome_message
        }
    }

    pub fn placeholder(&self) -> &str {
        if self.input_placeholder.trim().is_empty() {
            DEFAULT_INPUT_PLACEHOLDER
        } else {
            &self.input_placeholder
        }
    }

    pub fn button_icon(&self) -> ButtonIcon {
        match self.button_icon_type {
            ButtonIconType::Custom if !self.button_icon_image.trim().is_empty() => {
                ButtonIcon::Custom(self.button_icon_image.clone())
            }
            _ => ButtonIcon::Default,
        }
    }
}
