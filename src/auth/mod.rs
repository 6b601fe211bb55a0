//! Identity handling: the provider seam and the session observer that the
//! rest of the app watches to pick between the login and the tab trees.

mod cognito;

pub use cognito::CognitoIdentityProvider;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{error, info};

use crate::{error::AppError, model::Session};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Session restored by the provider at startup, if any.
    async fn current_session(&self) -> Result<Option<Session>, AppError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not reported yet.
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Publishes every sign-in/sign-out transition to its subscribers.
#[derive(Clone)]
pub struct SessionObserver {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<AuthState>>,
}

impl SessionObserver {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        SessionObserver {
            provider,
            state: Arc::new(state),
        }
    }

    /// Reports the initial session once. A provider failure counts as signed out.
    pub async fn start(&self) {
        let initial = match self.provider.current_session().await {
            Ok(Some(session)) => AuthState::Authenticated(session),
            Ok(None) => AuthState::Unauthenticated,
            Err(err) => {
                error!("Could not restore session: {}", err);
                AuthState::Unauthenticated
            }
        };
        self.state.send_replace(initial);
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let session = self.provider.sign_in(email, password).await?;
        info!("Signed in as {}", session.email);
        self.state
            .send_replace(AuthState::Authenticated(session.clone()));
        Ok(session)
    }

    /// Signs out; on provider failure the current session stays in place.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        let current = self.current();
        if let Some(session) = current.session() {
            self.provider.sign_out(session).await?;
            info!("Signed out {}", session.email);
        }
        self.state.send_replace(AuthState::Unauthenticated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticIdentityProvider;

    #[tokio::test]
    async fn starts_loading_then_reports_signed_out() {
        let observer = SessionObserver::new(Arc::new(StaticIdentityProvider::new()));
        assert_eq!(observer.current(), AuthState::Loading);

        let mut rx = observer.subscribe();
        observer.start().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn restored_session_is_reported_on_start() {
        let provider = StaticIdentityProvider::new().with_restored("ana@example.com");
        let observer = SessionObserver::new(Arc::new(provider));
        observer.start().await;
        let state = observer.current();
        assert_eq!(state.session().unwrap().email, "ana@example.com");
    }

    #[tokio::test]
    async fn sign_in_and_out_drive_both_transitions() {
        let provider = StaticIdentityProvider::new().with_user("ana@example.com", "secret");
        let observer = SessionObserver::new(Arc::new(provider));
        observer.start().await;

        let session = observer.sign_in("ana@example.com", "secret").await.unwrap();
        assert_eq!(observer.current(), AuthState::Authenticated(session));

        observer.sign_out().await.unwrap();
        assert_eq!(observer.current(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn bad_credentials_keep_the_user_signed_out() {
        let provider = StaticIdentityProvider::new().with_user("ana@example.com", "secret");
        let observer = SessionObserver::new(Arc::new(provider));
        observer.start().await;

        let err = observer.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));
        assert_eq!(observer.current(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn failed_sign_out_keeps_the_session() {
        let provider = StaticIdentityProvider::new()
            .with_user("ana@example.com", "secret")
            .failing_sign_out();
        let observer = SessionObserver::new(Arc::new(provider));
        observer.start().await;
        observer.sign_in("ana@example.com", "secret").await.unwrap();

        assert!(observer.sign_out().await.is_err());
        assert!(observer.current().session().is_some());
    }
}
