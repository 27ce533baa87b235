//! Adds `self` / `update` / `delete` links to outgoing task records.

use axum::http::{header, HeaderMap, Uri};

use crate::{
    task::Task,
    task_resource::{TaskLinks, TaskResource},
    web_api::routes::task_routes::ROUTER_PATH,
};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResolver {
    base_url: String,
}

impl ResourceResolver {
    /// `base_url` is everything before `/tasks`, e.g. `https://example.org/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_request(uri: &Uri, headers: &HeaderMap, mount_path: &str) -> Self {
        let scheme = headers
            .get(FORWARDED_PROTO)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("http");

        let host = uri
            .authority()
            .map(|authority| authority.as_str())
            .or_else(|| headers.get(header::HOST).and_then(|value| value.to_str().ok()))
            .filter(|value| !value.is_empty())
            .unwrap_or("localhost");

        Self::new(format!("{scheme}://{host}{mount_path}"))
    }

    pub fn resolve(&self, task: Option<Task>) -> Option<TaskResource> {
        task.map(|task| self.resolve_task(task))
    }

    pub fn resolve_task(&self, task: Task) -> TaskResource {
        let href = format!("{}{}/{}", self.base_url, ROUTER_PATH, task.id);
        TaskResource {
            task,
            links: TaskLinks {
                self_link: href.clone(),
                update: href.clone(),
                delete: href,
            },
        }
    }

    pub fn resolve_many(&self, tasks: Vec<Task>) -> Vec<TaskResource> {
        tasks.into_iter().map(|task| self.resolve_task(task)).collect()
    }
}
