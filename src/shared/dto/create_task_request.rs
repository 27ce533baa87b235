use serde::Deserialize;
use serde_json::Value;

/// Fields are kept as raw JSON: a non-string `body` or `status` falls back to
/// its default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<Value>,
    pub body: Option<Value>,
    pub status: Option<Value>,
}

impl CreateTaskRequest {
    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().and_then(Value::as_str)
    }

    pub fn body(&self) -> &str {
        self.body.as_ref().and_then(Value::as_str).unwrap_or_default()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().and_then(Value::as_str)
    }
}
