use serde::{Deserialize, Serialize};

/// Key every event is published under
pub const EVENT_KEY: &str = "eda_url_content";

/// Status code reported when no HTTP response was received
pub const NO_RESPONSE: u16 = 0;

/// Reachability of a polled URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
}

impl Status {
    /// Only an exact 200 counts as up. 204, redirects and every other code are down.
    pub fn from_code(status_code: u16) -> Self {
        if status_code == 200 {
            Status::Up
        } else {
            Status::Down
        }
    }
}

/// One observation of one URL in one poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollEvent {
    pub url: String,
    pub status: Status,
    pub status_code: u16,
    /// Response body, or the failure description when no response arrived
    pub content: String,
}

#[derive(Serialize)]
struct Envelope<'a> {
    eda_url_content: &'a PollEvent,
}

impl PollEvent {
    /// Event for a completed HTTP exchange, whatever its status code
    pub fn from_response(url: impl Into<String>, status_code: u16, body: String) -> Self {
        Self {
            url: url.into(),
            status: Status::from_code(status_code),
            status_code,
            content: body,
        }
    }

    /// Event for a request that never produced a response
    pub fn from_failure(url: impl Into<String>, description: String) -> Self {
        Self {
            url: url.into(),
            status: Status::Down,
            status_code: NO_RESPONSE,
            content: description,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == Status::Up
    }

    /// Wrap the event in its `{"eda_url_content": {...}}` envelope
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ EVENT_KEY: self })
    }

    /// Serialize the enveloped event as a single JSON line
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Envelope {
            eda_url_content: self,
        })
    }
}
