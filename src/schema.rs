use serde::{Deserialize, Serialize};

use crate::{
    navigation::Tab,
    notification::{AppPhase, RemoteMessage},
};

// Request body for the login form
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginSchema {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MotivationalSchema {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TabSchema {
    pub tab: Tab,
}

// Push relayed to this host; `foreground` says whether the app is active
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliverSchema {
    #[serde(flatten)]
    pub message: RemoteMessage,
    #[serde(default = "default_foreground")]
    pub foreground: bool,
}

fn default_foreground() -> bool {
    true
}

impl DeliverSchema {
    pub fn phase(&self) -> AppPhase {
        if self.foreground {
            AppPhase::Foreground
        } else {
            AppPhase::Background
        }
    }
}
