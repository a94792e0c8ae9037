use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use shared::{
    CreateTodoRequest, ListTodosRequest, SearchResponse, StatsResponse, Todo, TodoPriority,
    TodoStatus, UpdateTodoRequest,
};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Maximum title length, in characters
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum description length, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;
/// Page size used when a request does not specify a limit
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Everything that can go wrong inside the store
///
/// Every error is terminal for the triggering request; nothing is retried
/// and a failed operation never leaves a partial mutation behind.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("todo with id {0} not found")]
    NotFound(Uuid),
    #[error("title must be between 1 and {MAX_TITLE_LEN} characters")]
    InvalidTitle,
    #[error("description must be at most {MAX_DESCRIPTION_LEN} characters")]
    InvalidDescription,
    #[error("search query cannot be empty")]
    EmptyQuery,
}

/// In-memory collection of todos and every operation over it
///
/// The whole collection sits behind one `RwLock`: mutations take the write
/// lock, reads share the read lock, so a reader never observes a collection
/// mid-mutation. Insertion order is preserved and is the scan order for
/// list and search.
#[derive(Clone, Default)]
pub struct TodoStore {
    todos: Arc<RwLock<Vec<Todo>>>,
}

impl TodoStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the three sample records
    ///
    /// The samples carry non-pending statuses, so they are constructed
    /// directly instead of going through `create`.
    pub fn with_sample_data() -> Self {
        let now = Utc::now();
        let sample = |title: &str, description: &str, priority, status, due_date: &str| Todo {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: Some(description.to_string()),
            priority,
            status,
            due_date: Some(due_date.to_string()),
            created_at: now,
            updated_at: now,
        };
        let todos = vec![
            sample(
                "学习FastAPI",
                "完成第三天的学习任务",
                TodoPriority::High,
                TodoStatus::Completed,
                "2024-01-01",
            ),
            sample(
                "编写Todo API",
                "实现CRUD操作",
                TodoPriority::Medium,
                TodoStatus::InProgress,
                "2024-01-02",
            ),
            sample(
                "学习异步编程",
                "理解async/await语法",
                TodoPriority::Low,
                TodoStatus::Pending,
                "2024-01-03",
            ),
        ];
        Self {
            todos: Arc::new(RwLock::new(todos)),
        }
    }

    /// Create a new todo and append it to the collection
    ///
    /// The new record always starts out pending; validation runs before
    /// anything is stored.
    pub async fn create(&self, request: CreateTodoRequest) -> Result<Todo, TodoError> {
        info!("Creating todo: title={}", request.title);

        validate_title(&request.title)?;
        if let Some(description) = &request.description {
            validate_description(description)?;
        }

        let now = Utc::now();
        let todo = Todo {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            priority: request.priority,
            status: TodoStatus::Pending,
            due_date: request.due_date,
            created_at: now,
            updated_at: now,
        };

        self.todos.write().await.push(todo.clone());

        info!("Created todo {}", todo.id);
        Ok(todo)
    }

    /// Look up a single todo by id (linear scan, no index)
    pub async fn get(&self, id: Uuid) -> Result<Todo, TodoError> {
        let todos = self.todos.read().await;
        match todos.iter().find(|todo| todo.id == id) {
            Some(todo) => Ok(todo.clone()),
            None => {
                warn!("Todo not found: {}", id);
                Err(TodoError::NotFound(id))
            }
        }
    }

    /// List todos with optional status/priority filters and offset/limit
    /// pagination, in insertion order
    pub async fn list(&self, request: ListTodosRequest) -> Vec<Todo> {
        info!("Listing todos: {:?}", request);

        let (skip, limit) = page_bounds(request.skip, request.limit);
        let todos = self.todos.read().await;
        todos
            .iter()
            .filter(|todo| request.status_filter.map_or(true, |s| todo.status == s))
            .filter(|todo| request.priority.map_or(true, |p| todo.priority == p))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Apply the non-null fields of `request` to an existing todo
    ///
    /// PUT and PATCH share this operation. Supplied lengths are validated
    /// before the record is touched, so a rejected update mutates nothing.
    pub async fn update(&self, id: Uuid, request: UpdateTodoRequest) -> Result<Todo, TodoError> {
        info!("Updating todo {}", id);

        if let Some(title) = &request.title {
            validate_title(title)?;
        }
        if let Some(description) = &request.description {
            validate_description(description)?;
        }

        let mut todos = self.todos.write().await;
        let todo = todos
            .iter_mut()
            .find(|todo| todo.id == id)
            .ok_or(TodoError::NotFound(id))?;

        if let Some(title) = request.title {
            todo.title = title;
        }
        if let Some(description) = request.description {
            todo.description = Some(description);
        }
        if let Some(priority) = request.priority {
            todo.priority = priority;
        }
        if let Some(status) = request.status {
            todo.status = status;
        }
        if let Some(due_date) = request.due_date {
            todo.due_date = Some(due_date);
        }
        todo.updated_at = Utc::now();

        Ok(todo.clone())
    }

    /// Remove a todo permanently, returning it and the remaining count
    pub async fn delete(&self, id: Uuid) -> Result<(Todo, usize), TodoError> {
        info!("Deleting todo {}", id);

        let mut todos = self.todos.write().await;
        let index = todos
            .iter()
            .position(|todo| todo.id == id)
            .ok_or(TodoError::NotFound(id))?;
        let removed = todos.remove(index);

        info!("Deleted todo {}, {} remaining", id, todos.len());
        Ok((removed, todos.len()))
    }

    /// Mark a todo completed; idempotent apart from `updated_at`
    pub async fn mark_complete(&self, id: Uuid) -> Result<Todo, TodoError> {
        info!("Marking todo {} as completed", id);
        self.set_status(id, TodoStatus::Completed).await
    }

    /// Mark a todo in progress; idempotent apart from `updated_at`
    pub async fn mark_in_progress(&self, id: Uuid) -> Result<Todo, TodoError> {
        info!("Marking todo {} as in progress", id);
        self.set_status(id, TodoStatus::InProgress).await
    }

    async fn set_status(&self, id: Uuid, status: TodoStatus) -> Result<Todo, TodoError> {
        let mut todos = self.todos.write().await;
        let todo = todos
            .iter_mut()
            .find(|todo| todo.id == id)
            .ok_or(TodoError::NotFound(id))?;
        todo.status = status;
        todo.updated_at = Utc::now();
        Ok(todo.clone())
    }

    /// Case-insensitive substring search over titles and descriptions
    ///
    /// `total_found` counts every match; `results` is the `[skip, skip+limit)`
    /// page of the match list in insertion order.
    pub async fn search(
        &self,
        query: &str,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<SearchResponse, TodoError> {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            warn!("Rejecting blank search query");
            return Err(TodoError::EmptyQuery);
        }

        info!("Searching todos for '{}'", term);
        let (skip, limit) = page_bounds(skip, limit);
        let todos = self.todos.read().await;
        let matches: Vec<&Todo> = todos
            .iter()
            .filter(|todo| {
                todo.title.to_lowercase().contains(&term)
                    || todo
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            })
            .collect();

        let total_found = matches.len();
        let results = matches.into_iter().skip(skip).take(limit).cloned().collect();

        Ok(SearchResponse {
            results,
            total_found,
            search_term: term,
        })
    }

    /// Aggregate counts over the whole collection
    pub async fn stats(&self) -> StatsResponse {
        let todos = self.todos.read().await;
        let total = todos.len();

        if total == 0 {
            return StatsResponse {
                total_todos: 0,
                by_status: BTreeMap::new(),
                by_priority: BTreeMap::new(),
                completion_rate: 0.0,
                highest_priority_count: 0,
                message: Some("no todos yet".to_string()),
            };
        }

        // Zero-initialize over every enum value so absent values still show up
        let mut by_status: BTreeMap<String, usize> = TodoStatus::ALL
            .iter()
            .map(|status| (status.as_str().to_string(), 0))
            .collect();
        let mut by_priority: BTreeMap<String, usize> = TodoPriority::ALL
            .iter()
            .map(|priority| (priority.as_str().to_string(), 0))
            .collect();

        for todo in todos.iter() {
            *by_status.entry(todo.status.as_str().to_string()).or_insert(0) += 1;
            *by_priority.entry(todo.priority.as_str().to_string()).or_insert(0) += 1;
        }

        let completed = by_status
            .get(TodoStatus::Completed.as_str())
            .copied()
            .unwrap_or(0);
        let completion_rate = round2(completed as f64 / total as f64 * 100.0);
        let highest_priority_count = by_priority
            .get(TodoPriority::High.as_str())
            .copied()
            .unwrap_or(0);

        StatsResponse {
            total_todos: total,
            by_status,
            by_priority,
            completion_rate,
            highest_priority_count,
            message: None,
        }
    }
}

/// Resolve pagination parameters to usable slice bounds
///
/// Negative values clamp to zero, so a negative skip reads from the start
/// and a negative limit yields an empty page.
fn page_bounds(skip: Option<i64>, limit: Option<i64>) -> (usize, usize) {
    let skip = skip.unwrap_or(0).max(0) as usize;
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(0) as usize;
    (skip, limit)
}

/// Round to two decimal places, matching the wire contract for rates
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn validate_title(title: &str) -> Result<(), TodoError> {
    // Character count, not bytes: titles may be CJK
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(TodoError::InvalidTitle);
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), TodoError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(TodoError::InvalidDescription);
    }
    Ok(())
}
