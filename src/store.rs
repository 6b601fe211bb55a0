use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::AppError,
    model::{format_date, parse_date, NewTask, Task},
};

/// Create/list/delete access to the task collection.
///
/// There is deliberately no update: tasks are immutable once written.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks owned by `user_id`, oldest first. No tasks is an empty vec, not an error.
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, AppError>;

    /// Persists `new_task` and returns it with the id the store assigned.
    async fn create_task(&self, new_task: NewTask) -> Result<Task, AppError>;

    /// Removes the task. Deleting an unknown id succeeds.
    async fn delete_task(&self, id: &str) -> Result<(), AppError>;
}

// Row as stored; dates and category are kept as text
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    name: String,
    description: String,
    category: String,
    deadline: String,
    reminder: String,
    user_id: Option<String>,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category.parse()?,
            deadline: parse_date(&row.deadline)?,
            reminder: parse_date(&row.reminder)?,
            user_id: row.user_id,
        })
    }
}

pub struct SqliteTaskStore {
    db: Pool<Sqlite>,
}

impl SqliteTaskStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        SqliteTaskStore { db }
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, AppError> {
        let rows = query_as::<_, TaskRow>(
            "SELECT id, name, description, category, deadline, reminder, user_id FROM tasks WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, AppError> {
        let id = Uuid::new_v4().to_string();
        query(
            "INSERT INTO tasks (id, name, description, category, deadline, reminder, user_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new_task.name)
        .bind(&new_task.description)
        .bind(new_task.category.as_str())
        .bind(format_date(&new_task.deadline))
        .bind(format_date(&new_task.reminder))
        .bind(&new_task.user_id)
        .execute(&self.db)
        .await?;

        Ok(Task::from_new(id, new_task))
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        let rows_affected = query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        if rows_affected == 0 {
            debug!("Delete of unknown task {} ignored", id);
        }
        Ok(())
    }
}

/// Offline store: ids come from the creation time in milliseconds.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Task>>, AppError> {
        self.tasks
            .lock()
            .map_err(|_| AppError::StoreUnavailable("task list lock poisoned".to_string()))
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, AppError> {
        let tasks = self.lock()?;
        Ok(tasks
            .iter()
            .filter(|task| task.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, AppError> {
        let mut tasks = self.lock()?;
        let mut stamp = Utc::now().timestamp_millis();
        while tasks.iter().any(|task| task.id == stamp.to_string()) {
            stamp += 1;
        }
        let task = Task::from_new(stamp.to_string(), new_task);
        tasks.push(task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        self.lock()?.retain(|task| task.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_pool, model::TaskCategory};

    fn new_task(name: &str, category: TaskCategory, user_id: &str) -> NewTask {
        NewTask {
            name: name.to_string(),
            description: "Buy groceries for the weekend".to_string(),
            category,
            deadline: parse_date("2025-03-15").unwrap(),
            reminder: parse_date("2025-03-14").unwrap(),
            user_id: Some(user_id.to_string()),
        }
    }

    async fn stores() -> Vec<Box<dyn TaskStore>> {
        vec![
            Box::new(SqliteTaskStore::new(memory_pool().await)),
            Box::new(MemoryTaskStore::new()),
        ]
    }

    #[tokio::test]
    async fn created_task_is_listed_with_a_fresh_id() {
        for store in stores().await {
            let input = new_task("Shopping", TaskCategory::Shopping, "alice");
            let created = store.create_task(input.clone()).await.unwrap();
            assert!(!created.id.is_empty());

            let listed = store.list_tasks("alice").await.unwrap();
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0], Task::from_new(created.id.clone(), input));
        }
    }

    #[tokio::test]
    async fn every_category_survives_the_store() {
        for store in stores().await {
            for category in TaskCategory::ALL {
                store
                    .create_task(new_task(category.as_str(), category, "bob"))
                    .await
                    .unwrap();
            }
            let listed = store.list_tasks("bob").await.unwrap();
            let categories: Vec<_> = listed.iter().map(|task| task.category).collect();
            assert_eq!(categories, TaskCategory::ALL.to_vec());
        }
    }

    #[tokio::test]
    async fn listing_never_leaks_other_users_tasks() {
        for store in stores().await {
            store.create_task(new_task("Run", TaskCategory::Health, "alice")).await.unwrap();
            store.create_task(new_task("Exam", TaskCategory::School, "bob")).await.unwrap();

            let alice = store.list_tasks("alice").await.unwrap();
            assert_eq!(alice.len(), 1);
            assert!(alice.iter().all(|task| task.user_id.as_deref() == Some("alice")));
            assert!(store.list_tasks("carol").await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn deleted_task_disappears_and_unknown_ids_are_fine() {
        for store in stores().await {
            let keep = store.create_task(new_task("Keep", TaskCategory::Work, "alice")).await.unwrap();
            let gone = store.create_task(new_task("Drop", TaskCategory::Other, "alice")).await.unwrap();

            store.delete_task(&gone.id).await.unwrap();
            store.delete_task("does-not-exist").await.unwrap();

            let ids: Vec<_> = store
                .list_tasks("alice")
                .await
                .unwrap()
                .into_iter()
                .map(|task| task.id)
                .collect();
            assert_eq!(ids, vec![keep.id]);
        }
    }

    #[tokio::test]
    async fn memory_ids_stay_unique_within_one_millisecond() {
        let store = MemoryTaskStore::new();
        let a = store.create_task(new_task("A", TaskCategory::Work, "u")).await.unwrap();
        let b = store.create_task(new_task("B", TaskCategory::Work, "u")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn corrupted_rows_are_reported() {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO tasks (id, name, description, category, deadline, reminder, user_id) VALUES ('x', 'n', '', 'Work', 'soon', '2025-01-01', 'alice')")
            .execute(&pool)
            .await
            .unwrap();
        let store = SqliteTaskStore::new(pool);
        assert!(matches!(
            store.list_tasks("alice").await,
            Err(AppError::InvalidRecord(_))
        ));
    }
}
