//! Push notifications: device registration, message delivery and the
//! motivational-messages topic, whose local flag and remote subscription are
//! kept in step.

mod preference;
mod push;

pub use preference::{motivational_key, PreferenceStore, SqlitePreferenceStore};
pub use push::{FcmTransport, LocalTransport};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Notification {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteMessage {
    #[serde(default)]
    pub notification: Option<Notification>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Foreground,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Authorized,
    Provisional,
    Denied,
}

impl PermissionStatus {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PermissionStatus::Authorized | PermissionStatus::Provisional)
    }
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, AppError>;

    /// Registers this device and returns its push token.
    async fn register_device(&self) -> Result<String, AppError>;

    /// Message that launched the app from a cold start, if any.
    async fn initial_notification(&self) -> Result<Option<RemoteMessage>, AppError> {
        Ok(None)
    }

    async fn subscribe_to_topic(&self, topic: &str) -> Result<(), AppError>;

    async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), AppError>;
}

const FOREGROUND_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct NotificationBridge {
    transport: Arc<dyn PushTransport>,
    preferences: Arc<dyn PreferenceStore>,
    topic: String,
    foreground: broadcast::Sender<RemoteMessage>,
    token: Arc<Mutex<Option<String>>>,
}

impl NotificationBridge {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        preferences: Arc<dyn PreferenceStore>,
        topic: impl Into<String>,
    ) -> Self {
        let (foreground, _) = broadcast::channel(FOREGROUND_CAPACITY);
        NotificationBridge {
            transport,
            preferences,
            topic: topic.into(),
            foreground,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Registers the device token. Failures are logged and otherwise ignored.
    /// Called again later, a changed token is reported as a refresh.
    pub async fn register_device(&self) -> Option<String> {
        match self.transport.register_device().await {
            Ok(token) => {
                let previous = match self.token.lock() {
                    Ok(mut last) => last.replace(token.clone()),
                    Err(_) => None,
                };
                match previous {
                    Some(previous) if previous != token => info!("Push token refreshed: {}", token),
                    Some(_) => debug!("Push token unchanged"),
                    None => info!("Push token: {}", token),
                }
                Some(token)
            }
            Err(err) => {
                warn!("Push token registration failed: {}", err);
                None
            }
        }
    }

    pub async fn launch_notification(&self) -> Option<RemoteMessage> {
        match self.transport.initial_notification().await {
            Ok(Some(message)) => {
                info!("App opened from quit state by notification: {:?}", message);
                Some(message)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Could not read launch notification: {}", err);
                None
            }
        }
    }

    pub async fn request_permission(&self) -> bool {
        match self.transport.request_permission().await {
            Ok(status) if status.is_enabled() => {
                info!("Notification permissions granted");
                true
            }
            Ok(_) => {
                info!("Notification permissions denied");
                false
            }
            Err(err) => {
                warn!("Notification permission request failed: {}", err);
                false
            }
        }
    }

    pub fn foreground_messages(&self) -> broadcast::Receiver<RemoteMessage> {
        self.foreground.subscribe()
    }

    pub fn deliver(&self, message: RemoteMessage, phase: AppPhase) {
        match phase {
            AppPhase::Foreground => {
                info!("Received foreground message: {:?}", message);
                // Nobody listening just means no screen shows banners right now
                let _ = self.foreground.send(message);
            }
            AppPhase::Background => {
                info!("Message handled in the background: {:?}", message);
            }
        }
    }

    async fn apply_subscription(&self, enabled: bool) -> Result<(), AppError> {
        if enabled {
            self.transport.subscribe_to_topic(&self.topic).await
        } else {
            self.transport.unsubscribe_from_topic(&self.topic).await
        }
    }

    /// Switches the motivational topic for `user_id`.
    ///
    /// The remote subscription changes first; if that fails nothing is written
    /// locally. If the local write fails afterwards the remote side is put back
    /// to the previously saved value (off when nothing was saved).
    pub async fn set_motivational(&self, user_id: &str, enabled: bool) -> Result<(), AppError> {
        let key = motivational_key(user_id);
        let previous = self.preferences.get_bool(&key).await.unwrap_or_else(|err| {
            warn!("Could not read {}: {}", key, err);
            None
        });

        self.apply_subscription(enabled).await?;
        info!(
            "{} motivational messages topic",
            if enabled { "Subscribed to" } else { "Unsubscribed from" }
        );

        if let Err(err) = self.preferences.set_bool(&key, enabled).await {
            let restore = previous.unwrap_or(false);
            if restore != enabled {
                if let Err(rollback) = self.apply_subscription(restore).await {
                    error!("Rolling back topic subscription failed: {}", rollback);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Reads the saved flag and re-applies it remotely. Absent means off and
    /// issues no remote call.
    pub async fn reconcile_motivational(&self, user_id: &str) -> bool {
        let key = motivational_key(user_id);
        let saved = match self.preferences.get_bool(&key).await {
            Ok(saved) => saved,
            Err(err) => {
                warn!("Could not read {}: {}", key, err);
                None
            }
        };

        match saved {
            Some(enabled) => {
                if let Err(err) = self.apply_subscription(enabled).await {
                    warn!("Topic subscription out of sync: {}", err);
                }
                enabled
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryPreferenceStore, RecordingTransport, TopicCall};

    fn bridge(
        transport: &Arc<RecordingTransport>,
        preferences: &Arc<MemoryPreferenceStore>,
    ) -> NotificationBridge {
        NotificationBridge::new(
            transport.clone(),
            preferences.clone(),
            "motivational_messages",
        )
    }

    fn message(body: &str) -> RemoteMessage {
        RemoteMessage {
            notification: Some(Notification {
                title: None,
                body: Some(body.to_string()),
            }),
            data: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn enabling_subscribes_and_saves() {
        let transport = Arc::new(RecordingTransport::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let bridge = bridge(&transport, &preferences);

        bridge.set_motivational("ana", true).await.unwrap();

        assert_eq!(transport.calls(), vec![TopicCall::Subscribe("motivational_messages".to_string())]);
        assert_eq!(preferences.get_bool("motivational_messages_ana").await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn remote_failure_leaves_local_flag_alone() {
        let transport = Arc::new(RecordingTransport::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let bridge = bridge(&transport, &preferences);
        transport.fail_topics(true);

        let err = bridge.set_motivational("ana", true).await.unwrap_err();
        assert!(matches!(err, AppError::MessagingFailure(_)));
        assert_eq!(preferences.get_bool("motivational_messages_ana").await.unwrap(), None);
    }

    #[tokio::test]
    async fn local_failure_rolls_the_subscription_back() {
        let transport = Arc::new(RecordingTransport::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let bridge = bridge(&transport, &preferences);
        preferences.fail_writes(true);

        assert!(bridge.set_motivational("ana", true).await.is_err());
        assert_eq!(
            transport.calls(),
            vec![
                TopicCall::Subscribe("motivational_messages".to_string()),
                TopicCall::Unsubscribe("motivational_messages".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn reconcile_replays_the_saved_flag() {
        let transport = Arc::new(RecordingTransport::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let bridge = bridge(&transport, &preferences);

        assert!(!bridge.reconcile_motivational("ana").await);
        assert!(transport.calls().is_empty());

        preferences.set_bool("motivational_messages_ana", true).await.unwrap();
        assert!(bridge.reconcile_motivational("ana").await);
        assert!(bridge.reconcile_motivational("ana").await);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn only_foreground_messages_reach_subscribers() {
        let transport = Arc::new(RecordingTransport::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let bridge = bridge(&transport, &preferences);
        let mut rx = bridge.foreground_messages();

        bridge.deliver(message("quiet"), AppPhase::Background);
        bridge.deliver(message("hello"), AppPhase::Foreground);

        assert_eq!(rx.try_recv().unwrap(), message("hello"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn token_failure_is_not_fatal() {
        let transport = Arc::new(RecordingTransport::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let bridge = bridge(&transport, &preferences);
        assert_eq!(bridge.register_device().await.as_deref(), Some("test-token"));

        transport.fail_registration(true);
        assert_eq!(bridge.register_device().await, None);
    }

    #[tokio::test]
    async fn re_registering_picks_up_a_rotated_token() {
        let transport = Arc::new(RecordingTransport::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let bridge = bridge(&transport, &preferences);
        assert_eq!(bridge.register_device().await.as_deref(), Some("test-token"));

        transport.rotate_token();
        assert_eq!(bridge.register_device().await.as_deref(), Some("test-token-1"));
        assert_eq!(bridge.register_device().await.as_deref(), Some("test-token-1"));
    }
}
