//! Test doubles for the external collaborators.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    auth::IdentityProvider,
    error::AppError,
    model::{NewTask, Session, Task},
    notification::{PermissionStatus, PreferenceStore, PushTransport},
    store::{MemoryTaskStore, TaskStore},
};

pub fn session_for(email: &str) -> Session {
    Session {
        user_id: format!("uid-{}", email.split('@').next().unwrap_or(email)),
        email: email.to_string(),
        access_token: format!("token-{}", email),
    }
}

#[derive(Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, String>,
    restored: Option<Session>,
    fail_sign_out: bool,
    sign_in_calls: Mutex<usize>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, email: &str, password: &str) -> Self {
        self.users.insert(email.to_string(), password.to_string());
        self
    }

    pub fn with_restored(mut self, email: &str) -> Self {
        self.restored = Some(session_for(email));
        self
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub fn sign_in_calls(&self) -> usize {
        *self.sign_in_calls.lock().unwrap()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self.restored.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        *self.sign_in_calls.lock().unwrap() += 1;
        match self.users.get(email) {
            Some(expected) if expected == password => Ok(session_for(email)),
            _ => Err(AppError::AuthFailure("NotAuthorizedException".to_string())),
        }
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), AppError> {
        if self.fail_sign_out {
            return Err(AppError::AuthFailure("network down".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicCall {
    Subscribe(String),
    Unsubscribe(String),
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TopicCall>>,
    fail_topics: AtomicBool,
    fail_registration: AtomicBool,
    rotations: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<TopicCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_topics(&self, fail: bool) {
        self.fail_topics.store(fail, Ordering::SeqCst);
    }

    pub fn fail_registration(&self, fail: bool) {
        self.fail_registration.store(fail, Ordering::SeqCst);
    }

    pub fn rotate_token(&self) {
        self.rotations.fetch_add(1, Ordering::SeqCst);
    }

    fn record(&self, call: TopicCall) -> Result<(), AppError> {
        if self.fail_topics.load(Ordering::SeqCst) {
            return Err(AppError::MessagingFailure("topic call refused".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn request_permission(&self) -> Result<PermissionStatus, AppError> {
        Ok(PermissionStatus::Authorized)
    }

    async fn register_device(&self) -> Result<String, AppError> {
        if self.fail_registration.load(Ordering::SeqCst) {
            return Err(AppError::MessagingFailure("no token".to_string()));
        }
        match self.rotations.load(Ordering::SeqCst) {
            0 => Ok("test-token".to_string()),
            n => Ok(format!("test-token-{}", n)),
        }
    }

    async fn subscribe_to_topic(&self, topic: &str) -> Result<(), AppError> {
        self.record(TopicCall::Subscribe(topic.to_string()))
    }

    async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), AppError> {
        self.record(TopicCall::Unsubscribe(topic.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, bool>>,
    fail_writes: AtomicBool,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, AppError> {
        Ok(self.values.lock().unwrap().get(key).copied())
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("disk full".to_string()));
        }
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// Wraps a memory store and can be switched to fail every call.
#[derive(Default)]
pub struct FlakyTaskStore {
    inner: MemoryTaskStore,
    down: AtomicBool,
}

impl FlakyTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("backend unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for FlakyTaskStore {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, AppError> {
        self.check()?;
        self.inner.list_tasks(user_id).await
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, AppError> {
        self.check()?;
        self.inner.create_task(new_task).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        self.check()?;
        self.inner.delete_task(id).await
    }
}
