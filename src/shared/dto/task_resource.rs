use serde::Serialize;

use crate::task::Task;

/// A task as clients see it: the stored row plus its hypermedia links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResource {
    #[serde(flatten)]
    pub task: Task,
    pub links: TaskLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub update: String,
    pub delete: String,
}
