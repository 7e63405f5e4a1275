use std::fmt;
use std::str::FromStr;

use super::BridgeError;

/// Host operations the UI side may invoke. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeChannel {
    GetAppVersion,
    ShowMessageBox,
    ShowOpenDialog,
}

impl InvokeChannel {
    pub const ALL: [InvokeChannel; 3] = [
        InvokeChannel::GetAppVersion,
        InvokeChannel::ShowMessageBox,
        InvokeChannel::ShowOpenDialog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InvokeChannel::GetAppVersion => "get-app-version",
            InvokeChannel::ShowMessageBox => "show-message-box",
            InvokeChannel::ShowOpenDialog => "show-open-dialog",
        }
    }

    /// Dialogs wait on the user and are exempt from the bridge deadline.
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            InvokeChannel::ShowMessageBox | InvokeChannel::ShowOpenDialog
        )
    }
}

impl FromStr for InvokeChannel {
    type Err = BridgeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.name() == name)
            .ok_or_else(|| BridgeError::ChannelNotAllowed(name.to_string()))
    }
}

impl fmt::Display for InvokeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events the host may push to the UI side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventChannel {
    ReindexFiles,
    AddFolder,
}

impl EventChannel {
    pub const ALL: [EventChannel; 2] = [EventChannel::ReindexFiles, EventChannel::AddFolder];

    pub fn name(self) -> &'static str {
        match self {
            EventChannel::ReindexFiles => "reindex-files",
            EventChannel::AddFolder => "add-folder",
        }
    }
}

impl FromStr for EventChannel {
    type Err = BridgeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.name() == name)
            .ok_or_else(|| BridgeError::ChannelNotAllowed(name.to_string()))
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
