use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BridgeError, EventChannel};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageBoxKind {
    #[default]
    None,
    Info,
    Error,
    Question,
    Warning,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageBoxOptions {
    #[serde(default, rename = "type")]
    pub kind: MessageBoxKind,
    #[serde(default)]
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageBoxResult {
    /// Index of the clicked button.
    pub response: usize,
    #[serde(default)]
    pub checkbox_checked: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DialogProperty {
    OpenFile,
    OpenDirectory,
    MultiSelections,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,
    #[serde(default)]
    pub properties: Vec<DialogProperty>,
}

impl OpenDialogOptions {
    pub fn directory(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            default_path: None,
            properties: vec![DialogProperty::OpenDirectory],
        }
    }

    pub fn wants_directory(&self) -> bool {
        self.properties.contains(&DialogProperty::OpenDirectory)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogResult {
    pub canceled: bool,
    #[serde(default)]
    pub file_paths: Vec<String>,
}

impl OpenDialogResult {
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            file_paths: Vec::new(),
        }
    }

    pub fn selected(path: impl Into<String>) -> Self {
        Self {
            canceled: false,
            file_paths: vec![path.into()],
        }
    }

    /// First selected path, unless the dialog was cancelled.
    pub fn first_path(&self) -> Option<&str> {
        if self.canceled {
            return None;
        }
        self.file_paths.first().map(String::as_str)
    }
}

/// An event pushed from the host to the UI side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ReindexFiles,
    AddFolder(String),
}

impl HostEvent {
    pub fn channel(&self) -> EventChannel {
        match self {
            HostEvent::ReindexFiles => EventChannel::ReindexFiles,
            HostEvent::AddFolder(_) => EventChannel::AddFolder,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            HostEvent::ReindexFiles => Value::Null,
            HostEvent::AddFolder(path) => Value::String(path.clone()),
        }
    }

    pub fn from_parts(channel: &str, payload: Value) -> Result<Self, BridgeError> {
        match channel.parse::<EventChannel>()? {
            EventChannel::ReindexFiles => Ok(HostEvent::ReindexFiles),
            EventChannel::AddFolder => match payload {
                Value::String(path) if !path.trim().is_empty() => Ok(HostEvent::AddFolder(path)),
                other => Err(BridgeError::Payload(format!(
                    "add-folder expects a path, got {other}"
                ))),
            },
        }
    }
}
