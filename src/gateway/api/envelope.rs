use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ShellError;

pub const NETWORK_FAILURE: &str = "network failure";
pub const INVALID_RESPONSE: &str = "invalid response";
const REQUEST_FAILED: &str = "request failed";

/// Uniform `{success, data?, message?}` response shape of every backend call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn network_failure() -> Self {
        Self::failure(NETWORK_FAILURE)
    }

    pub fn is_network_failure(&self) -> bool {
        !self.success && self.message.as_deref() == Some(NETWORK_FAILURE)
    }

    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }

    /// Collapse the envelope into a `Result`, keeping the backend message on failure.
    pub fn into_result(self) -> Result<Option<T>, ShellError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ShellError::Backend(
                self.message.unwrap_or_else(|| REQUEST_FAILED.to_string()),
            ))
        }
    }
}

impl Envelope<Value> {
    /// Decode the loosely typed `data` member into `T`.
    ///
    /// A successful envelope whose data does not match `T` becomes an
    /// `invalid response` failure. Failed envelopes keep their message.
    pub fn decode<T: DeserializeOwned>(self) -> Envelope<T> {
        let Envelope {
            success,
            data,
            message,
        } = self;
        match data {
            None => Envelope {
                success,
                data: None,
                message,
            },
            Some(value) => match serde_json::from_value::<T>(value) {
                Ok(decoded) => Envelope {
                    success,
                    data: Some(decoded),
                    message,
                },
                Err(_) if success => Envelope::failure(INVALID_RESPONSE),
                Err(_) => Envelope {
                    success,
                    data: None,
                    message,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_members_deserialize_as_none() {
        let env: Envelope<Value> = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(env.success);
        assert!(env.data.is_none());
        assert!(env.message.is_none());
    }

    #[test]
    fn decode_mismatched_success_data_is_invalid_response() {
        let raw: Envelope<Value> = Envelope::ok(json!("not a list"));
        let decoded: Envelope<Vec<u32>> = raw.decode();
        assert!(!decoded.success);
        assert_eq!(decoded.message.as_deref(), Some(INVALID_RESPONSE));
    }

    #[test]
    fn decode_tolerates_null_members_in_hits() {
        let raw: Envelope<Value> = Envelope::ok(json!([{
            "fileName": "report.pdf",
            "filePath": "/docs/report.pdf",
            "fileType": null,
            "fileSize": null,
            "lastModified": "2024-03-01 10:00:00"
        }]));
        let decoded: Envelope<Vec<crate::gateway::SearchHit>> = raw.decode();
        assert!(decoded.success);
        assert_eq!(decoded.data.unwrap()[0].file_path, "/docs/report.pdf");
    }

    #[test]
    fn decode_keeps_failure_message() {
        let raw = Envelope::<Value> {
            success: false,
            data: Some(json!({"code": 500})),
            message: Some("folder does not exist".to_string()),
        };
        let decoded: Envelope<Vec<u32>> = raw.decode();
        assert!(!decoded.success);
        assert_eq!(decoded.message.as_deref(), Some("folder does not exist"));
    }

    #[test]
    fn into_result_surfaces_backend_message() {
        let env: Envelope<u32> = Envelope::failure("path already watched");
        match env.into_result() {
            Err(ShellError::Backend(message)) => assert_eq!(message, "path already watched"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(Envelope::ok(3u32).into_result().unwrap(), Some(3));
    }
}
