use serde::Serialize;
use tracing::{error, warn};

use super::Alert;
use crate::{
    auth::SessionObserver, error::AppError, model::Session, notification::NotificationBridge,
};

#[derive(Debug, Default)]
pub struct SettingsScreen {
    mounted: bool,
    receive_motivational: bool,
    alert: Option<Alert>,
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub email: String,
    pub receive_motivational: bool,
    pub alert: Option<Alert>,
}

impl SettingsScreen {
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Asks for push permission and brings the switch and the remote topic in
    /// line with the locally saved preference.
    pub async fn mount(&mut self, session: &Session, bridge: &NotificationBridge) {
        bridge.request_permission().await;
        self.receive_motivational = bridge.reconcile_motivational(&session.user_id).await;
        self.alert = None;
        self.mounted = true;
    }

    pub async fn toggle_motivational(
        &mut self,
        session: &Session,
        bridge: &NotificationBridge,
        enabled: bool,
    ) {
        match bridge.set_motivational(&session.user_id, enabled).await {
            Ok(()) => {
                self.receive_motivational = enabled;
                self.alert = Some(Alert::new(
                    "Settings saved",
                    format!(
                        "Motivational messages {}.",
                        if enabled { "enabled" } else { "disabled" }
                    ),
                ));
            }
            Err(err) => {
                error!("Error toggling subscription: {}", err);
                self.alert = Some(Alert::new(
                    "Error",
                    "Something went wrong while changing settings. Please try again.",
                ));
            }
        }
    }

    /// Ends the session. On failure the user stays signed in and sees an alert.
    pub async fn sign_out(&mut self, observer: &SessionObserver) -> Result<(), AppError> {
        match observer.sign_out().await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Sign-out failed: {}", err);
                self.alert = Some(Alert::new(
                    "Error",
                    "Something went wrong while signing out. Please try again.",
                ));
                Err(AppError::SignOutFailure(err.to_string()))
            }
        }
    }

    pub fn view(&self, session: &Session) -> SettingsView {
        SettingsView {
            email: session.email.clone(),
            receive_motivational: self.receive_motivational,
            alert: self.alert.clone(),
        }
    }
}
