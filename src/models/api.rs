use serde::{ Serialize, Deserialize };
use serde_json::{ Map, Value };

const REPLY_FIELDS: [&str; 2] = ["reply", "respuesta"];

#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub text: &'a str,
    pub site_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
}

/// Response body as sent by the backend: a JSON object carrying `reply`.
/// Older deployments answer with `respuesta` instead.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
pub struct ChatResponseBody {
    fields: Map<String, Value>,
}

impl ChatResponseBody {
    /// First non-blank string among `reply` and `respuesta`, in that order.
    pub fn reply(&self) -> Option<&str> {
        REPLY_FIELDS.iter().find_map(|field| {
            self.fields
                .get(*field)
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
        })
    }
}
