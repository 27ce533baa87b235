use serde::Deserialize;

/// Fields not listed here are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
}
