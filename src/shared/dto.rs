// Requests
pub mod create_task_request;
pub mod update_task_request;
pub mod change_status_request;

// Responses
pub mod api_response;
pub mod task_resource;
