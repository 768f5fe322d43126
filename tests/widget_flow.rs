use axum::extract::State;
use axum::http::{ HeaderMap, StatusCode };
use axum::routing::post;
use axum::{ Json, Router };
use serde_json::{ json, Value };
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use support_widget::api::ApiClient;
use support_widget::config::{ WidgetConfig, DEFAULT_ERROR_MESSAGE };
use support_widget::format::Formatter;
use support_widget::history::{ MemoryStorage, SessionStorage };
use support_widget::models::chat::Sender;
use support_widget::widget::WidgetController;
use support_widget::widget::state::WidgetPhase;
use support_widget::widget::view::HeadlessView;

#[derive(Debug, Clone)]
struct Recorded {
    body: Value,
    api_key: Option<String>,
}

type Shared = Arc<Mutex<Vec<Recorded>>>;

fn record(state: &Shared, headers: &HeaderMap, body: &Value) {
    state.lock().unwrap().push(Recorded {
        body: body.clone(),
        api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    });
}

async fn reply_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>
) -> Json<Value> {
    record(&state, &headers, &body);
    let text = body["text"].as_str().unwrap_or_default().to_string();
    Json(json!({ "reply": format!("Echo: {}\nSee [docs](https://example.com/docs)", text) }))
}

async fn fail_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>
) -> StatusCode {
    record(&state, &headers, &body);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn no_reply_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>
) -> Json<Value> {
    record(&state, &headers, &body);
    Json(json!({ "status": "ok" }))
}

async fn hang_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>
) -> StatusCode {
    record(&state, &headers, &body);
    std::future::pending::<()>().await;
    StatusCode::OK
}

async fn spawn_api() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/chat", post(reply_handler))
        .route("/fail", post(fail_handler))
        .route("/noreply", post(no_reply_handler))
        .route("/hang", post(hang_handler))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn widget_for(
    config: WidgetConfig,
    session: Arc<dyn SessionStorage>
) -> (WidgetController, HeadlessView) {
    let view = HeadlessView::new();
    let widget = WidgetController::new(
        config,
        Box::new(view.clone()),
        Arc::new(ApiClient::new()),
        session,
        Formatter::default()
    );
    (widget, view)
}

fn config(api_url: String) -> WidgetConfig {
    WidgetConfig {
        api_url,
        site_id: "shop".into(),
        api_key: "secret".into(),
        welcome_message: "Welcome!".into(),
        error_message: "Oops, try again".into(),
        ..WidgetConfig::default()
    }
}

fn bot_messages(view: &HeadlessView) -> Vec<String> {
    view.snapshot()
        .messages
        .into_iter()
        .filter(|(sender, _)| *sender == Sender::Bot)
        .map(|(_, html)| html)
        .collect()
}

#[tokio::test]
async fn exchange_follows_the_wire_contract() {
    let (base, recorded) = spawn_api().await;
    let (mut widget, view) = widget_for(config(format!("{}/chat", base)), Arc::new(MemoryStorage::new()));
    widget.init();
    widget.open();

    assert!(widget.send("Hello **world**").await);

    let snap = view.snapshot();
    assert_eq!(snap.messages.len(), 3);
    assert_eq!(snap.messages[1], (Sender::User, "Hello **world**".to_string()));
    assert_eq!(
        snap.messages[2].1,
        r#"Echo: Hello <strong>world</strong><br>See <a href="https://example.com/docs" target="_blank" rel="noopener noreferrer">docs</a>"#
    );
    assert!(snap.input_enabled);
    assert!(!snap.typing);
    assert_eq!(widget.phase(), WidgetPhase::OpenIdle);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].body, json!({ "text": "Hello **world**", "site_id": "shop" }));
    assert_eq!(recorded[0].api_key.as_deref(), Some("secret"));
}

#[tokio::test]
async fn empty_api_key_sends_no_header() {
    let (base, recorded) = spawn_api().await;
    let config = WidgetConfig { api_key: String::new(), ..config(format!("{}/chat", base)) };
    let (mut widget, _view) = widget_for(config, Arc::new(MemoryStorage::new()));
    widget.open();
    widget.send("hi").await;
    assert_eq!(recorded.lock().unwrap()[0].api_key, None);
}

#[tokio::test]
async fn server_error_shows_configured_message() {
    let (base, _recorded) = spawn_api().await;
    let (mut widget, view) = widget_for(config(format!("{}/fail", base)), Arc::new(MemoryStorage::new()));
    widget.open();
    widget.send("hi").await;

    assert_eq!(bot_messages(&view), vec!["Welcome!".to_string(), "Oops, try again".to_string()]);
    assert!(view.snapshot().input_enabled);
    assert_eq!(widget.phase(), WidgetPhase::OpenIdle);
}

#[tokio::test]
async fn server_error_without_message_uses_default() {
    let (base, _recorded) = spawn_api().await;
    let config = WidgetConfig { error_message: "   ".into(), ..config(format!("{}/fail", base)) };
    let (mut widget, view) = widget_for(config, Arc::new(MemoryStorage::new()));
    widget.open();
    widget.send("hi").await;
    assert_eq!(bot_messages(&view).last().unwrap(), DEFAULT_ERROR_MESSAGE);
}

#[tokio::test]
async fn response_without_reply_is_a_failure() {
    let (base, _recorded) = spawn_api().await;
    let (mut widget, view) = widget_for(config(format!("{}/noreply", base)), Arc::new(MemoryStorage::new()));
    widget.open();
    widget.send("hi").await;
    assert_eq!(bot_messages(&view).last().unwrap(), "Oops, try again");
}

#[tokio::test]
async fn unreachable_backend_is_a_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (mut widget, view) = widget_for(config(format!("http://{}/chat", addr)), Arc::new(MemoryStorage::new()));
    widget.open();
    widget.send("anyone there?").await;
    assert_eq!(bot_messages(&view).len(), 2);
    assert_eq!(widget.phase(), WidgetPhase::OpenIdle);
}

#[tokio::test]
async fn hung_backend_keeps_widget_sending() {
    let (base, recorded) = spawn_api().await;
    let (mut widget, view) = widget_for(config(format!("{}/hang", base)), Arc::new(MemoryStorage::new()));
    widget.open();

    let pending = widget.submit("hello?").unwrap();
    let request = widget.dispatch(pending);
    let waited = tokio::time::timeout(Duration::from_millis(500), request).await;
    assert!(waited.is_err());

    assert_eq!(widget.phase(), WidgetPhase::OpenSending);
    assert!(widget.submit("still there?").is_none());
    assert!(view.snapshot().typing);
    assert!(!view.snapshot().input_enabled);
    assert_eq!(bot_messages(&view).len(), 1);
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn every_accepted_message_gets_exactly_one_bot_message() {
    let (base, recorded) = spawn_api().await;
    let (mut widget, view) = widget_for(config(format!("{}/chat", base)), Arc::new(MemoryStorage::new()));
    widget.open();

    let inputs = ["first", "   ", "second", "", "\n", "third"];
    let mut sent = 0;
    for input in inputs {
        if widget.send(input).await {
            sent += 1;
        }
    }

    let snap = view.snapshot();
    let users = snap.messages.iter().filter(|(s, _)| *s == Sender::User).count();
    assert_eq!(sent, 3);
    assert_eq!(users, 3);
    assert_eq!(bot_messages(&view).len(), 1 + 3);
    assert_eq!(recorded.lock().unwrap().len(), 3);
    for pair in snap.messages[1..].chunks(2) {
        assert_eq!(pair[0].0, Sender::User);
        assert_eq!(pair[1].0, Sender::Bot);
    }
}

#[tokio::test]
async fn reopening_in_the_same_session_restores_the_conversation() {
    let (base, _recorded) = spawn_api().await;
    let session: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());

    let (mut first, first_view) = widget_for(config(format!("{}/chat", base)), session.clone());
    first.init();
    first.open();
    first.send("where are the docs?").await;
    let shown = first_view.snapshot().messages;
    drop(first);

    let (mut second, second_view) = widget_for(config(format!("{}/chat", base)), session);
    second.init();
    second.toggle();

    let restored = second_view.snapshot().messages;
    assert_eq!(restored, shown);
    assert_eq!(restored.iter().filter(|(_, html)| html == "Welcome!").count(), 1);
    assert_eq!(second.history().len(), restored.len());
}
