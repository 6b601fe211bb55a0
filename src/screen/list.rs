use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{error, info};

use crate::{
    error::AppError,
    model::{format_date, Task},
    notification::RemoteMessage,
    store::TaskStore,
};

pub const CONFIRM_DELETE_MESSAGE: &str = "Are you sure you want to delete this task?";
const DEFAULT_BANNER: &str = "New message";

/// The signed-in user's tasks as last fetched, plus local changes since.
#[derive(Debug, Default)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    loaded: bool,
}

impl TaskCollection {
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.loaded = true;
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.loaded = false;
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn remove(&mut self, id: &str) {
        self.tasks.retain(|task| task.id != id);
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPhase {
    Loading,
    Empty,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeletePrompt {
    Idle,
    ConfirmPending { task_id: String },
}

#[derive(Debug, Serialize)]
pub struct ListRow {
    pub id: String,
    pub name: String,
    pub deadline: String,
}

#[derive(Debug, Serialize)]
pub struct ListView {
    pub phase: ListPhase,
    pub tasks: Vec<ListRow>,
    pub banner: Option<String>,
    pub prompt: DeletePrompt,
    pub confirm_message: Option<&'static str>,
}

pub struct ListScreen {
    prompt: DeletePrompt,
    banner: Option<String>,
    messages: broadcast::Receiver<RemoteMessage>,
}

impl ListScreen {
    pub fn new(messages: broadcast::Receiver<RemoteMessage>) -> Self {
        ListScreen {
            prompt: DeletePrompt::Idle,
            banner: None,
            messages,
        }
    }

    /// Swipe on a row: ask for confirmation before anything is deleted.
    pub fn request_delete(&mut self, tasks: &TaskCollection, task_id: &str) -> Result<(), AppError> {
        if tasks.get(task_id).is_none() {
            return Err(AppError::NotFound(format!("Task with ID: {}", task_id)));
        }
        self.prompt = DeletePrompt::ConfirmPending {
            task_id: task_id.to_string(),
        };
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.prompt = DeletePrompt::Idle;
    }

    /// Deletes the pending task remotely, then locally. A store failure is
    /// logged and leaves the collection as it was. Always ends Idle.
    pub async fn confirm_delete(&mut self, tasks: &mut TaskCollection, store: &dyn TaskStore) {
        let prompt = std::mem::replace(&mut self.prompt, DeletePrompt::Idle);
        let DeletePrompt::ConfirmPending { task_id } = prompt else {
            return;
        };

        match store.delete_task(&task_id).await {
            Ok(()) => {
                tasks.remove(&task_id);
                info!("Task deleted: {}", task_id);
            }
            Err(err) => error!("Failed to delete task {}: {}", task_id, err),
        }
    }

    // Only the newest message is kept
    fn drain_messages(&mut self) {
        loop {
            match self.messages.try_recv() {
                Ok(message) => {
                    if let Some(notification) = message.notification {
                        self.banner = Some(
                            notification
                                .body
                                .filter(|body| !body.is_empty())
                                .unwrap_or_else(|| DEFAULT_BANNER.to_string()),
                        );
                    }
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    pub fn view(&mut self, tasks: &TaskCollection) -> ListView {
        self.drain_messages();

        let phase = if !tasks.is_loaded() {
            ListPhase::Loading
        } else if tasks.tasks().is_empty() {
            ListPhase::Empty
        } else {
            ListPhase::Populated
        };
        let rows = tasks
            .tasks()
            .iter()
            .map(|task| ListRow {
                id: task.id.clone(),
                name: task.name.clone(),
                deadline: format_date(&task.deadline),
            })
            .collect();
        let confirm_message = match self.prompt {
            DeletePrompt::ConfirmPending { .. } => Some(CONFIRM_DELETE_MESSAGE),
            DeletePrompt::Idle => None,
        };

        ListView {
            phase,
            tasks: rows,
            banner: self.banner.clone(),
            prompt: self.prompt.clone(),
            confirm_message,
        }
    }
}
