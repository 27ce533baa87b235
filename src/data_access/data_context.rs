//! Storage gateway: parameterized SQL over a single lazily-opened connection.
//!
//! The connection is opened on first use and reused for the life of the
//! process. Statements are serialized through the mutex; there is no pool.

use std::sync::Arc;

use sqlx::{
    any::{install_default_drivers, AnyArguments, AnyRow},
    query::Query,
    Any, AnyConnection, Connection, Row,
};
use tokio::sync::Mutex;

use crate::settings::DatabaseSettings;

const MYSQL: &str = "MySQL";
const SQLITE: &str = "SQLite";

const MYSQL_TASKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    body TEXT NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'pending',
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const SQLITE_TASKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("{0}")]
    Query(#[from] sqlx::Error),
    #[error("unsupported storage backend: {0}")]
    UnsupportedBackend(String),
    #[error("malformed {column} value in storage: {value:?}")]
    Decode { column: &'static str, value: String },
    #[error("insert did not report a row id")]
    MissingInsertId,
}

#[derive(Clone)]
pub struct DataContext {
    settings: Arc<DatabaseSettings>,
    connection: Arc<Mutex<Option<AnyConnection>>>,
}

impl DataContext {
    /// Does not touch the database; the connection opens on the first statement.
    pub fn new(settings: DatabaseSettings) -> Self {
        install_default_drivers();
        DataContext {
            settings: Arc::new(settings),
            connection: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<AnyRow>, StorageError> {
        let mut slot = self.connection.lock().await;
        let connection = self.checkout(&mut slot).await?;
        let result = bind_params(sql, params).fetch_all(connection).await;
        Self::settle(&mut slot, result)
    }

    pub async fn fetch_optional(&self, sql: &str, params: &[SqlParam]) -> Result<Option<AnyRow>, StorageError> {
        let mut slot = self.connection.lock().await;
        let connection = self.checkout(&mut slot).await?;
        let result = bind_params(sql, params).fetch_optional(connection).await;
        Self::settle(&mut slot, result)
    }

    /// Returns the number of rows affected.
    pub async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, StorageError> {
        let mut slot = self.connection.lock().await;
        let connection = self.checkout(&mut slot).await?;
        let result = bind_params(sql, params).execute(connection).await;
        Ok(Self::settle(&mut slot, result)?.rows_affected())
    }

    /// Runs an `INSERT` and returns the `id` assigned to the new row.
    ///
    /// The Any driver only reports insert ids for MySQL, so on SQLite the
    /// statement is run with `RETURNING id` instead.
    pub async fn insert(&self, sql: &str, params: &[SqlParam]) -> Result<i64, StorageError> {
        let mut slot = self.connection.lock().await;
        let connection = self.checkout(&mut slot).await?;

        if connection.backend_name() == SQLITE {
            let returning = format!("{sql} RETURNING id");
            let result = bind_params(&returning, params).fetch_one(connection).await;
            let row = Self::settle(&mut slot, result)?;
            return Ok(row.try_get::<i64, _>("id")?);
        }

        let result = bind_params(sql, params).execute(connection).await;
        let done = Self::settle(&mut slot, result)?;
        done.last_insert_id().ok_or(StorageError::MissingInsertId)
    }

    async fn checkout<'a>(
        &self,
        slot: &'a mut Option<AnyConnection>,
    ) -> Result<&'a mut AnyConnection, StorageError> {
        let connection = match slot.take() {
            Some(connection) => connection,
            None => self.open().await?,
        };
        Ok(slot.insert(connection))
    }

    async fn open(&self) -> Result<AnyConnection, StorageError> {
        let url = self.settings.connection_url();
        let mut connection = AnyConnection::connect(&url)
            .await
            .map_err(StorageError::Connect)?;
        tracing::info!(backend = connection.backend_name(), "storage connection opened");

        if self.settings.bootstrap_schema {
            let ddl = match connection.backend_name() {
                MYSQL => MYSQL_TASKS_TABLE,
                SQLITE => SQLITE_TASKS_TABLE,
                other => return Err(StorageError::UnsupportedBackend(other.to_string())),
            };
            sqlx::query(ddl).execute(&mut connection).await?;
        }
        Ok(connection)
    }

    // A dead socket is dropped so the next statement reconnects.
    fn settle<T>(
        slot: &mut Option<AnyConnection>,
        result: Result<T, sqlx::Error>,
    ) -> Result<T, StorageError> {
        result.map_err(|e| {
            if matches!(e, sqlx::Error::Io(_)) {
                tracing::warn!(error = %e, "dropping broken storage connection");
                *slot = None;
            }
            tracing::error!(error = %e, "statement failed");
            StorageError::Query(e)
        })
    }
}

fn bind_params<'q>(sql: &'q str, params: &[SqlParam]) -> Query<'q, Any, AnyArguments<'q>> {
    params.iter().fold(sqlx::query(sql), |query, param| match param {
        SqlParam::Int(value) => query.bind(*value),
        SqlParam::Text(value) => query.bind(value.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSERT_TASK: &str = "INSERT INTO tasks (title, body, status) VALUES (?, ?, ?)";

    fn memory_context() -> DataContext {
        DataContext::new(DatabaseSettings::with_url("sqlite::memory:"))
    }

    #[tokio::test]
    async fn connection_is_lazy() {
        let context = DataContext::new(DatabaseSettings::with_url("sqlite:///nonexistent/dir/tasks.db"));
        assert!(context.connection.lock().await.is_none());
        let Err(err) = context.fetch_all("SELECT 1", &[]).await else {
            panic!("connecting to a missing directory should fail");
        };
        assert!(matches!(err, StorageError::Connect(_)), "{err}");
        assert!(err.to_string().starts_with("Database connection failed"));
    }

    #[tokio::test]
    async fn insert_reports_increasing_ids_on_sqlite() {
        let context = memory_context();
        let first = context
            .insert(INSERT_TASK, &["a".into(), "".into(), "pending".into()])
            .await
            .unwrap();
        let second = context
            .insert(INSERT_TASK, &["b".into(), "".into(), "done".into()])
            .await
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn execute_reports_rows_affected() {
        let context = memory_context();
        context
            .insert(INSERT_TASK, &["a".into(), "".into(), "pending".into()])
            .await
            .unwrap();
        let changed = context
            .execute("UPDATE tasks SET status = ? WHERE id = ?", &["done".into(), SqlParam::Int(1)])
            .await
            .unwrap();
        let untouched = context
            .execute("DELETE FROM tasks WHERE id = ?", &[SqlParam::Int(99)])
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(untouched, 0);
    }

    #[tokio::test]
    async fn same_connection_serves_every_statement() {
        // In-memory SQLite is per connection, so a reopen would lose the row.
        let context = memory_context();
        let id = context
            .insert(INSERT_TASK, &["kept".into(), "".into(), "pending".into()])
            .await
            .unwrap();
        let row = context
            .fetch_optional("SELECT title FROM tasks WHERE id = ?", &[SqlParam::Int(id)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get::<String, _>("title").unwrap(), "kept");
    }

    #[tokio::test]
    async fn query_errors_pass_the_driver_message_through() {
        let context = memory_context();
        let Err(err) = context.fetch_all("SELECT * FROM no_such_table", &[]).await else {
            panic!("query against a missing table should fail");
        };
        assert!(matches!(err, StorageError::Query(_)));
        assert!(err.to_string().contains("no_such_table"), "{err}");
    }
}
