pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod format;
pub mod history;
pub mod models;
pub mod widget;

use api::ApiClient;
use cli::Args;
use config::WidgetConfig;
use console::ConsoleView;
use format::Formatter;
use format::sanitize::FallbackSanitizer;
use history::{ FileStorage, MemoryStorage, SessionStorage };
use log::info;
use std::error::Error;
use std::sync::Arc;
use widget::WidgetController;

pub fn load_config(args: &Args) -> Result<WidgetConfig, config::ConfigError> {
    let base = match &args.config {
        Some(path) => WidgetConfig::load(path)?,
        None => {
            info!("No widget config file given; using defaults");
            WidgetConfig::default()
        }
    };
    let config = base.with_overrides(
        args.api_url.clone(),
        args.api_key.clone(),
        args.site_id.clone()
    );
    config.validate()?;
    Ok(config)
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = load_config(&args)?;

    info!("--- Widget Configuration ---");
    info!("Site ID: {}", config.site_id);
    info!("API URL: {}", config.api_url);
    info!("API Key: {}", if config.api_key.is_empty() { "not set" } else { "set" });
    info!("Button: {} {}px", config.button_position.as_str(), config.button_size.px());
    info!("Prefs File: {}", args.prefs_file.as_deref().unwrap_or("none"));
    info!("Fallback Sanitizer: {}", args.fallback_sanitizer);
    info!("----------------------------");

    let formatter = if args.fallback_sanitizer {
        Formatter::new(Arc::new(FallbackSanitizer))
    } else {
        Formatter::default()
    };
    let session: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
    let mut widget = WidgetController::new(
        config,
        Box::new(ConsoleView::new()),
        Arc::new(ApiClient::new()),
        session,
        formatter
    );
    if let Some(path) = &args.prefs_file {
        widget = widget.with_open_state(Arc::new(FileStorage::new(path)));
    }

    widget.init();
    if !args.start_closed {
        widget.open();
    }
    console::run(widget).await
}
