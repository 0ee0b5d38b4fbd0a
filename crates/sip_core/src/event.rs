use serde::Deserialize;
use serde_json::Value;

/// A structured event decoded from one `data: ` line.
///
/// Anything that does not deserialize into this shape (including JSON without a
/// string `type`) is handled as raw text instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<Value>,
    /// Seconds since the epoch; receipt time is used when absent.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ConnectionEstablished,
    PromptGenerated,
    FileGenerated,
    StreamComplete,
    StreamError,
    FatalError,
    StreamEnd,
    AgentProcessing,
    AgentResponse,
    Other,
}

impl StreamEvent {
    pub fn parse(payload: &str) -> Option<Self> {
        serde_json::from_str(payload).ok()
    }

    /// Classifies the tag; `completion_event` names the tag that ends a run.
    pub fn kind(&self, completion_event: &str) -> EventKind {
        if self.event_type == completion_event {
            return EventKind::StreamComplete;
        }
        match self.event_type.as_str() {
            "connection_established" => EventKind::ConnectionEstablished,
            "prompt_generated" => EventKind::PromptGenerated,
            "file_generated" => EventKind::FileGenerated,
            "stream_error" => EventKind::StreamError,
            "fatal_error" => EventKind::FatalError,
            "stream_end" => EventKind::StreamEnd,
            "agent_processing" => EventKind::AgentProcessing,
            "agent_response" => EventKind::AgentResponse,
            _ => EventKind::Other,
        }
    }

    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.as_object()?.get(key)
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data_field(key)?.as_str()
    }

    /// First non-empty string among `keys`.
    pub fn data_str_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.data_str(key))
            .find(|value| !value.is_empty())
    }

    /// Message carried by `stream_error` / `fatal_error`.
    pub fn error_message(&self) -> String {
        if let Some(message) = self.data_str_any(&["error", "message"]) {
            return message.to_string();
        }
        match &self.data {
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            _ => "Stream reported an error".to_string(),
        }
    }
}
