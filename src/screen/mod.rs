//! Headless screens. Each one keeps only its own UI state and reaches the
//! outside world through the adapters it is handed.

pub mod add;
pub mod details;
pub mod list;
pub mod login;
pub mod settings;

pub use add::{AddTaskForm, AddTaskView};
pub use details::DetailsView;
pub use list::{ListScreen, ListView, TaskCollection};
pub use login::{LoginScreen, LoginView};
pub use settings::{SettingsScreen, SettingsView};

use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::notification::RemoteMessage;

const DEFAULT_PUSH_TITLE: &str = "New message";

/// Modal alert shown on top of a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Alert {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// App-wide alert for foreground pushes, raised over whichever screen is showing.
pub struct PushAlerts {
    messages: broadcast::Receiver<RemoteMessage>,
}

impl PushAlerts {
    pub fn new(messages: broadcast::Receiver<RemoteMessage>) -> Self {
        PushAlerts { messages }
    }

    /// Newest unread push as an alert; reading it dismisses it.
    pub fn take(&mut self) -> Option<Alert> {
        let mut latest = None;
        loop {
            match self.messages.try_recv() {
                Ok(message) => latest = Some(message),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        let notification = latest?.notification.unwrap_or_default();
        let title = notification
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_PUSH_TITLE.to_string());
        Some(Alert::new(title, notification.body.unwrap_or_default()))
    }
}
