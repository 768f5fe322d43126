use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Widget Config Args ---
    /// Path to the widget config JSON (the object the CMS settings layer injects into the page).
    #[arg(long, env = "WIDGET_CONFIG")]
    pub config: Option<String>,

    /// Chat API endpoint; overrides apiUrl from the config file.
    #[arg(long, env = "CHAT_API_URL")]
    pub api_url: Option<String>,

    /// Key sent in the X-API-Key header; overrides apiKey from the config file.
    #[arg(long, env = "CHAT_API_KEY")]
    pub api_key: Option<String>,

    /// Site identifier sent with every message; overrides siteId from the config file.
    #[arg(long, env = "CHAT_SITE_ID")]
    pub site_id: Option<String>,

    // --- Host Args ---
    /// File that remembers whether the window was left open between runs.
    #[arg(long, env = "WIDGET_PREFS_FILE")]
    pub prefs_file: Option<String>,

    /// Use the best-effort script/handler stripper instead of the allow-list sanitizer.
    #[arg(long, env = "FALLBACK_SANITIZER", default_value = "false")]
    pub fallback_sanitizer: bool,

    /// Keep the window closed on start unless it was left open last time.
    #[arg(long, env = "START_CLOSED", default_value = "false")]
    pub start_closed: bool,
}
