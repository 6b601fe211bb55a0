use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Task, TaskCategory};

const NO_DESCRIPTION: &str = "No description";

#[derive(Debug, Serialize)]
pub struct DetailsView {
    pub id: String,
    pub name: String,
    pub category: TaskCategory,
    pub description: String,
    pub deadline: String,
    pub reminder: String,
}

// "2025-03-15" reads as "15. 03. 2025"
fn display_date(date: &NaiveDate) -> String {
    date.format("%d. %m. %Y").to_string()
}

impl From<&Task> for DetailsView {
    fn from(task: &Task) -> Self {
        let description = if task.description.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            task.description.clone()
        };
        DetailsView {
            id: task.id.clone(),
            name: task.name.clone(),
            category: task.category,
            description,
            deadline: display_date(&task.deadline),
            reminder: display_date(&task.reminder),
        }
    }
}
