use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Priority of a todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    Low,
    /// Default priority for newly created todos
    #[default]
    Medium,
    High,
}

impl TodoPriority {
    /// Every priority value, in ascending order
    pub const ALL: [TodoPriority; 3] = [TodoPriority::Low, TodoPriority::Medium, TodoPriority::High];

    /// Wire representation of this priority
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoPriority::Low => "low",
            TodoPriority::Medium => "medium",
            TodoPriority::High => "high",
        }
    }
}

/// Lifecycle status of a todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Status every todo starts in
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    /// Every status value, in lifecycle order
    pub const ALL: [TodoStatus; 3] = [TodoStatus::Pending, TodoStatus::InProgress, TodoStatus::Completed];

    /// Wire representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        }
    }
}

/// A single todo record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, assigned by the store at creation
    pub id: Uuid,
    /// Short summary (1-100 characters)
    pub title: String,
    /// Longer free-form description (max 500 characters)
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub status: TodoStatus,
    /// Opaque due date string, stored as-is
    pub due_date: Option<String>,
    /// Set once when the todo is created
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new todo
///
/// There is deliberately no `status` field: new todos always start out
/// pending, and any status a client sends is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TodoPriority,
    pub due_date: Option<String>,
}

/// Payload for updating an existing todo
///
/// Only the fields that are present and non-null are applied; everything
/// else is left untouched. PUT and PATCH both carry this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TodoPriority>,
    pub status: Option<TodoStatus>,
    pub due_date: Option<String>,
}

/// Query parameters for the todo list endpoint
///
/// `skip`/`limit` are signed so that out-of-range values reach the store,
/// which clamps them to zero rather than rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTodosRequest {
    /// Number of matching records to skip (pagination offset)
    pub skip: Option<i64>,
    /// Maximum number of records to return
    pub limit: Option<i64>,
    /// Only return todos with exactly this status
    pub status_filter: Option<TodoStatus>,
    /// Only return todos with exactly this priority
    pub priority: Option<TodoPriority>,
}

/// Response body for a successful delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTodoResponse {
    pub message: String,
    pub deleted_todo: Todo,
    /// Collection size after the removal
    pub remaining_count: usize,
}

/// Response body for the complete/start shortcuts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub todo: Todo,
}

/// Result of a keyword search over titles and descriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The requested page of matches, in insertion order
    pub results: Vec<Todo>,
    /// Total number of matches before pagination
    pub total_found: usize,
    /// The normalized (trimmed, lowercased) search term
    pub search_term: String,
}

/// Aggregate counts over the whole collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_todos: usize,
    /// Occurrence count for every status value (empty when the store is empty)
    pub by_status: BTreeMap<String, usize>,
    /// Occurrence count for every priority value (empty when the store is empty)
    pub by_priority: BTreeMap<String, usize>,
    /// Percentage of completed todos, rounded to two decimal places
    pub completion_rate: f64,
    /// Number of todos with high priority
    pub highest_priority_count: usize,
    /// Informational note, only set when there is nothing to count
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_and_status_use_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&TodoPriority::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&TodoStatus::InProgress).unwrap(), "\"in_progress\"");
        let status: TodoStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, TodoStatus::InProgress);
    }

    #[test]
    fn as_str_matches_serde_encoding() {
        for status in TodoStatus::ALL {
            let encoded = serde_json::to_value(status).unwrap();
            assert_eq!(encoded, status.as_str());
        }
        for priority in TodoPriority::ALL {
            let encoded = serde_json::to_value(priority).unwrap();
            assert_eq!(encoded, priority.as_str());
        }
    }

    #[test]
    fn create_request_defaults_priority_to_medium() {
        let request: CreateTodoRequest = serde_json::from_str(r#"{"title":"Buy milk"}"#).unwrap();
        assert_eq!(request.priority, TodoPriority::Medium);
        assert!(request.description.is_none());
        assert!(request.due_date.is_none());
    }

    #[test]
    fn create_request_rejects_missing_title() {
        let result: Result<CreateTodoRequest, _> = serde_json::from_str(r#"{"priority":"low"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_request_all_fields_optional() {
        let request: UpdateTodoRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, UpdateTodoRequest::default());
    }

    #[test]
    fn todo_serializes_optional_fields_as_null() {
        let todo = Todo {
            id: Uuid::nil(),
            title: "Test".to_string(),
            description: None,
            priority: TodoPriority::Medium,
            status: TodoStatus::Pending,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert!(json["description"].is_null());
        assert!(json["due_date"].is_null());
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
    }
}
