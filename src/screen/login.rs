use serde::Serialize;
use tracing::warn;

use super::Alert;
use crate::auth::SessionObserver;

#[derive(Debug, Default)]
pub struct LoginScreen {
    loading: bool,
    alert: Option<Alert>,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub loading: bool,
    pub button_label: &'static str,
    pub alert: Option<Alert>,
}

impl LoginScreen {
    /// Exchanges credentials through the observer. Success is not handled
    /// here: the observer's transition swaps the navigation tree.
    pub async fn submit(&mut self, email: &str, password: &str, observer: &SessionObserver) {
        self.alert = None;
        if email.trim().is_empty() || password.is_empty() {
            self.alert = Some(Alert::new(
                "Error",
                "Please enter your email address and password",
            ));
            return;
        }

        self.loading = true;
        if let Err(err) = observer.sign_in(email.trim(), password).await {
            warn!("Login failed: {}", err);
            self.loading = false;
            self.alert = Some(Alert::new(
                "Login failed",
                "Check your email address and password and try again.",
            ));
        }
    }

    pub fn view(&self) -> LoginView {
        LoginView {
            loading: self.loading,
            button_label: if self.loading { "Signing in..." } else { "Sign in" },
            alert: self.alert.clone(),
        }
    }
}
