use futures::future::{ self, BoxFuture };
use log::{ debug, info, warn };
use std::error::Error;
use std::io::ErrorKind;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, BufReader };
use crate::api::ApiError;
use crate::config::ButtonIcon;
use crate::format::sanitize::visible_text;
use crate::models::api::ChatReply;
use crate::models::chat::Sender;
use crate::widget::{ WidgetController, WidgetEvent };
use crate::widget::state::WidgetPhase;
use crate::widget::view::WidgetView;

/// Prints the widget to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleView {
    typing: bool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WidgetView for ConsoleView {
    fn apply_theme(&mut self, variables: &[(&'static str, String)]) {
        for (name, value) in variables {
            debug!("theme {}: {}", name, value);
        }
    }

    fn apply_button(&mut self, position_class: &str, icon: &ButtonIcon) {
        debug!("button {} ({:?})", position_class, icon);
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        debug!("placeholder: {}", placeholder);
    }

    fn set_open(&mut self, open: bool) {
        println!("{}", if open { "── chat opened ──" } else { "── chat closed ──" });
    }

    fn append_message(&mut self, sender: Sender, html: &str) {
        let label = match sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        for (i, line) in visible_text(html).lines().enumerate() {
            if i == 0 {
                println!("[{}] {}", label, line);
            } else {
                println!("      {}", line);
            }
        }
    }

    fn clear_messages(&mut self) {
        println!("── history cleared ──");
    }

    fn show_typing(&mut self) {
        self.typing = true;
        println!("[bot] …");
    }

    fn remove_typing(&mut self) {
        self.typing = false;
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        debug!("input {}", if enabled { "enabled" } else { "disabled" });
    }

    fn clear_input(&mut self) {}

    fn focus_input(&mut self) {}
}

#[derive(Debug)]
enum Command {
    Event(WidgetEvent),
    Quit,
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "/quit" | "/exit" => Command::Quit,
        "/open" => Command::Event(WidgetEvent::Open),
        "/close" => Command::Event(WidgetEvent::Close),
        "/toggle" => Command::Event(WidgetEvent::Toggle),
        "/clear" => Command::Event(WidgetEvent::ClearHistory),
        _ => Command::Event(WidgetEvent::Submit(line.to_string())),
    }
}

/// Feeds stdin lines to the controller and replies back as they arrive.
/// At most one request is in flight; lines typed meanwhile hit the
/// controller's loading guard. On EOF the pending reply, if any, is awaited.
pub async fn run(widget: WidgetController) -> Result<(), Box<dyn Error + Send + Sync>> {
    drive(widget, BufReader::new(tokio::io::stdin())).await
}

async fn drive<R>(mut widget: WidgetController, input: R) -> Result<(), Box<dyn Error + Send + Sync>>
    where R: AsyncBufRead + Unpin
{
    let mut lines = input.lines();
    let mut in_flight: Option<BoxFuture<'static, Result<ChatReply, ApiError>>> = None;
    let mut stdin_done = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if !stdin_done => {
                let line = match line {
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        warn!("Skipping unreadable input line: {}", e);
                        continue;
                    }
                    other => other?,
                };
                let Some(line) = line else {
                    stdin_done = true;
                    if in_flight.is_none() {
                        break;
                    }
                    continue;
                };
                match parse_command(&line) {
                    Command::Quit => break,
                    Command::Event(event) => {
                        let is_submit = matches!(event, WidgetEvent::Submit(_));
                        if is_submit && widget.phase() == WidgetPhase::Closed {
                            println!("(chat is closed; type /open)");
                        }
                        if let Some(pending) = widget.handle(event) {
                            in_flight = Some(widget.dispatch(pending));
                        }
                    }
                }
            }
            result = async {
                match in_flight.as_mut() {
                    Some(request) => request.await,
                    None => future::pending().await,
                }
            }, if in_flight.is_some() => {
                in_flight = None;
                widget.handle(WidgetEvent::Reply(result));
                if stdin_done {
                    break;
                }
            }
        }
    }

    info!("Widget {} leaving with {} message(s)", widget.id(), widget.history().len());
    Ok(())
}
