use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier. FastAPI hands out integers, json-server may use strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId::Number(id)
    }
}

// Task struct
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: String,
}

/// Body of `POST /todos`. `description` is always sent, as `null` when blank.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

impl NewTask {
    pub fn from_input(title: &str, description: &str) -> Result<NewTask, AppError> {
        Ok(NewTask {
            title: validate_title(title)?,
            description: normalize_description(description),
        })
    }
}

/// Partial body of `PUT /todos/{id}`; unset fields are left out of the JSON.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn completion(completed: bool) -> TaskUpdate {
        TaskUpdate {
            completed: Some(completed),
            ..TaskUpdate::default()
        }
    }

    /// The backend ignores `null` fields on update, so a cleared description
    /// is sent as `""`. A blank field on a task without one is left out.
    pub fn content(
        title: &str,
        description: &str,
        previous: Option<&str>,
    ) -> Result<TaskUpdate, AppError> {
        let title = validate_title(title)?;
        let description = match normalize_description(description) {
            Some(description) => Some(description),
            None if previous.map_or(false, |p| !p.is_empty()) => Some(String::new()),
            None => None,
        };
        Ok(TaskUpdate {
            title: Some(title),
            description,
            completed: None,
        })
    }
}

/// Counters returned by `GET /health`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub status: Option<String>,
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Pending,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Completed => task.completed,
            Filter::Pending => !task.completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Completed => "Completed",
            Filter::Pending => "Pending",
        }
    }
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Task title cannot be empty."));
    }
    Ok(title.to_string())
}

fn normalize_description(description: &str) -> Option<String> {
    let description = description.trim();
    if description.is_empty() {
        None
    } else {
        Some(description.to_string())
    }
}
