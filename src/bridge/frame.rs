use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire unit exchanged between the two processes, JSON-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Invoke {
        id: u64,
        channel: String,
        #[serde(default)]
        payload: Value,
    },
    Reply {
        id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ok: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Event {
        channel: String,
        #[serde(default)]
        payload: Value,
    },
}

impl Frame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn reply(id: u64, outcome: Result<Value, String>) -> Self {
        match outcome {
            Ok(value) => Frame::Reply {
                id,
                ok: Some(value),
                error: None,
            },
            Err(message) => Frame::Reply {
                id,
                ok: None,
                error: Some(message),
            },
        }
    }
}
