use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Fixed set of task categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskCategory {
    School,
    #[default]
    Work,
    Personal,
    Shopping,
    Health,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 6] = [
        TaskCategory::School,
        TaskCategory::Work,
        TaskCategory::Personal,
        TaskCategory::Shopping,
        TaskCategory::Health,
        TaskCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::School => "School",
            TaskCategory::Work => "Work",
            TaskCategory::Personal => "Personal",
            TaskCategory::Shopping => "Shopping",
            TaskCategory::Health => "Health",
            TaskCategory::Other => "Other",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| AppError::InvalidRecord(format!("unknown category `{}`", s)))
    }
}

// Data model representing a to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: TaskCategory,
    pub deadline: NaiveDate,
    pub reminder: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Task {
    pub fn from_new(id: String, new_task: NewTask) -> Self {
        Task {
            id,
            name: new_task.name,
            description: new_task.description,
            category: new_task.category,
            deadline: new_task.deadline,
            reminder: new_task.reminder,
            user_id: new_task.user_id,
        }
    }
}

// Everything a task needs before the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub category: TaskCategory,
    pub deadline: NaiveDate,
    pub reminder: NaiveDate,
    #[serde(default)]
    pub user_id: Option<String>,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| AppError::InvalidRecord(format!("malformed date `{}`", value)))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Identity handle handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

// Inserted into request extensions once the auth gate has passed
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub(crate) session: Session,
}
