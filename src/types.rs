use serde::Deserialize;

pub const NO_SUBJECT: &str = "(No subject)";

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Message {
    pub id: Option<String>,
    pub snippet: Option<String>,
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MessagePart {
    pub headers: Option<Vec<Header>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Header {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// Google's JSON error envelope: `{"error": {"code": 400, "message": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl Message {
    /// Case-insensitive header lookup; the first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .as_ref()?
            .iter()
            .find(|h| {
                h.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .and_then(|h| h.value.as_deref())
    }
}

/// One row of the inbox, projected from a metadata-format message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub snippet: String,
}

impl InboxEntry {
    /// `requested_id` is used when the response omits its own id.
    pub fn from_metadata(requested_id: &str, message: &Message) -> Self {
        let subject = match message.header("Subject") {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => NO_SUBJECT.to_string(),
        };
        Self {
            id: message
                .id
                .clone()
                .unwrap_or_else(|| requested_id.to_string()),
            from: message.header("From").unwrap_or_default().to_string(),
            subject,
            date: message.header("Date").unwrap_or_default().to_string(),
            snippet: message.snippet.clone().unwrap_or_default(),
        }
    }
}
