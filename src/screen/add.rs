use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::TaskCollection;
use crate::{
    model::{NewTask, Session, Task, TaskCategory},
    store::TaskStore,
};

/// Form state of the add-task screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTaskForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: TaskCategory,
    pub deadline: NaiveDate,
    pub reminder: NaiveDate,
}

impl AddTaskForm {
    /// Blank form; both date pickers start on `today`.
    pub fn new(today: NaiveDate) -> Self {
        AddTaskForm {
            name: String::new(),
            description: String::new(),
            category: TaskCategory::default(),
            deadline: today,
            reminder: today,
        }
    }

    pub fn into_new_task(self, user_id: Option<String>) -> NewTask {
        NewTask {
            name: self.name,
            description: self.description,
            category: self.category,
            deadline: self.deadline,
            reminder: self.reminder,
            user_id,
        }
    }

    /// Creates the task and appends it to `tasks`. Failures are logged only;
    /// the caller navigates back either way.
    pub async fn submit(
        self,
        session: Option<&Session>,
        tasks: &mut TaskCollection,
        store: &dyn TaskStore,
    ) -> Option<Task> {
        if self.name.trim().is_empty() {
            warn!("Ignoring task without a name");
            return None;
        }

        let new_task = self.into_new_task(session.map(|s| s.user_id.clone()));
        debug!("Submitting task {:?}", new_task);

        match store.create_task(new_task).await {
            Ok(task) => {
                info!("Task added with ID: {}", task.id);
                tasks.push(task.clone());
                Some(task)
            }
            Err(err) => {
                error!("Failed to add task: {}", err);
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddTaskView {
    pub form: AddTaskForm,
    pub categories: [TaskCategory; 6],
}

impl AddTaskView {
    pub fn blank() -> Self {
        AddTaskView {
            form: AddTaskForm::new(Utc::now().date_naive()),
            categories: TaskCategory::ALL,
        }
    }
}
