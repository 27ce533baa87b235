use chrono::NaiveDateTime;
use sqlx::{any::AnyRow, Row};

use crate::{
    data_access::data_context::{DataContext, SqlParam, StorageError},
    task::{NewTask, Task, TaskChanges, TaskId},
    task_status::TaskStatus,
};

// body and created_at are cast to text so MySQL TEXT/TIMESTAMP and SQLite TEXT decode alike.
const SELECT_COLUMNS: &str =
    "SELECT id, title, CAST(body AS CHAR) AS body, status, CAST(created_at AS CHAR) AS created_at FROM tasks";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Validation(String),
    #[error("Nothing to update")]
    NothingToUpdate,
    #[error("Task not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct TaskRepository {
    data_context: DataContext,
}

impl TaskRepository {
    pub fn new(data_context: DataContext) -> Self {
        Self { data_context }
    }

    /// Newest first. Rows created within the same second fall back to id order.
    pub async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC");
        let rows = self.data_context.fetch_all(&sql, &[]).await?;
        rows.iter().map(task_from_row).collect()
    }

    pub async fn find(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        match self.data_context.fetch_optional(&sql, &[SqlParam::Int(id)]).await? {
            Some(row) => Ok(Some(task_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Inserts and returns the row as stored, with its assigned id and timestamp.
    pub async fn create(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let title = required_title(&task.title, "Title is required")?;
        let body = task.body.trim().to_string();

        let id = self
            .data_context
            .insert(
                "INSERT INTO tasks (title, body, status) VALUES (?, ?, ?)",
                &[title.into(), body.into(), task.status.as_str().into()],
            )
            .await?;
        tracing::debug!(id, "task created");

        self.find(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Applies the present fields. Shape is checked first, then existence,
    /// and only then does the UPDATE run.
    pub async fn update(&self, id: TaskId, changes: TaskChanges) -> Result<Task, RepositoryError> {
        if changes.is_empty() {
            return Err(RepositoryError::NothingToUpdate);
        }

        let mut assignments = Vec::new();
        let mut params: Vec<SqlParam> = Vec::new();
        if let Some(title) = &changes.title {
            assignments.push("title = ?");
            params.push(required_title(title, "Title cannot be empty")?.into());
        }
        if let Some(body) = &changes.body {
            assignments.push("body = ?");
            params.push(body.trim().into());
        }
        if let Some(status) = changes.status {
            assignments.push("status = ?");
            params.push(status.as_str().into());
        }
        params.push(SqlParam::Int(id));

        if !self.exists(id).await? {
            return Err(RepositoryError::NotFound);
        }

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", assignments.join(", "));
        let rows = self.data_context.execute(&sql, &params).await?;
        tracing::debug!(id, rows, fields = assignments.len(), "task updated");

        self.find(id).await?.ok_or(RepositoryError::NotFound)
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        if !self.exists(id).await? {
            return Err(RepositoryError::NotFound);
        }
        let rows = self
            .data_context
            .execute("DELETE FROM tasks WHERE id = ?", &[SqlParam::Int(id)])
            .await?;
        tracing::debug!(id, rows, "task deleted");
        Ok(())
    }

    async fn exists(&self, id: TaskId) -> Result<bool, RepositoryError> {
        let row = self
            .data_context
            .fetch_optional("SELECT id FROM tasks WHERE id = ?", &[SqlParam::Int(id)])
            .await?;
        Ok(row.is_some())
    }
}

fn required_title(raw: &str, message: &str) -> Result<String, RepositoryError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(RepositoryError::Validation(message.to_string()));
    }
    Ok(title.to_string())
}

fn task_from_row(row: &AnyRow) -> Result<Task, RepositoryError> {
    let status: String = row.try_get("status").map_err(StorageError::from)?;
    let created_at: String = row.try_get("created_at").map_err(StorageError::from)?;
    let body: Option<String> = row.try_get("body").map_err(StorageError::from)?;

    Ok(Task {
        id: row.try_get("id").map_err(StorageError::from)?,
        title: row.try_get("title").map_err(StorageError::from)?,
        body: body.unwrap_or_default(),
        status: status.parse::<TaskStatus>().map_err(|_| StorageError::Decode {
            column: "status",
            value: status.clone(),
        })?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, StorageError> {
    // MySQL may append fractional seconds; keep the whole-second prefix.
    let whole_seconds = raw.split('.').next().unwrap_or(raw);
    NaiveDateTime::parse_from_str(whole_seconds, TIMESTAMP_FORMAT).map_err(|_| StorageError::Decode {
        column: "created_at",
        value: raw.to_string(),
    })
}
