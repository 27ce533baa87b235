pub mod task_controller;

use serde_json::{Map, Value};

use super::{resource_resolver::ResourceResolver, router::PathParams};

/// What a handler gets besides the application state: the captured path
/// parameters, the decoded JSON object body (empty when absent or not an
/// object) and a link builder for this request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub params: PathParams,
    pub input: Map<String, Value>,
    pub resolver: ResourceResolver,
}
