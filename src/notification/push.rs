use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use super::{PermissionStatus, PushTransport};
use crate::{config::FcmConfig, error::AppError};

const IID_BASE_URL: &str = "https://iid.googleapis.com/iid";

/// Firebase Cloud Messaging through the instance-id topic API.
pub struct FcmTransport {
    http: Client,
    config: FcmConfig,
}

impl FcmTransport {
    pub fn new(config: FcmConfig) -> Self {
        FcmTransport {
            http: Client::new(),
            config,
        }
    }

    fn auth_header(&self) -> String {
        format!("key={}", self.config.server_key)
    }

    async fn batch(&self, action: &str, topic: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/v1:{}", IID_BASE_URL, action))
            .header(AUTHORIZATION, self.auth_header())
            .json(&json!({
                "to": format!("/topics/{}", topic),
                "registration_tokens": [self.config.device_token],
            }))
            .send()
            .await?
            .error_for_status()?;
        debug!("FCM {} for {} returned {}", action, topic, response.status());
        Ok(())
    }
}

#[async_trait]
impl PushTransport for FcmTransport {
    // Permission is granted on the device before the token ever reaches us
    async fn request_permission(&self) -> Result<PermissionStatus, AppError> {
        Ok(PermissionStatus::Authorized)
    }

    async fn register_device(&self) -> Result<String, AppError> {
        self.http
            .get(format!("{}/info/{}", IID_BASE_URL, self.config.device_token))
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?
            .error_for_status()?;
        Ok(self.config.device_token.clone())
    }

    async fn subscribe_to_topic(&self, topic: &str) -> Result<(), AppError> {
        self.batch("batchAdd", topic).await
    }

    async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), AppError> {
        self.batch("batchRemove", topic).await
    }
}

/// Stand-in used when no push credentials are configured.
pub struct LocalTransport {
    token: String,
}

impl LocalTransport {
    pub fn new() -> Self {
        LocalTransport {
            token: format!("local-{}", Uuid::new_v4()),
        }
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTransport for LocalTransport {
    async fn request_permission(&self) -> Result<PermissionStatus, AppError> {
        Ok(PermissionStatus::Provisional)
    }

    async fn register_device(&self) -> Result<String, AppError> {
        Ok(self.token.clone())
    }

    async fn subscribe_to_topic(&self, topic: &str) -> Result<(), AppError> {
        info!("Local push: subscribed to {}", topic);
        Ok(())
    }

    async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), AppError> {
        info!("Local push: unsubscribed from {}", topic);
        Ok(())
    }
}
