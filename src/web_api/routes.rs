pub mod task_routes;

use super::router::{RouteError, RouteTable};

/// Every action the service exposes. The dispatcher maps each one to a
/// `TaskController` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListTasks,
    ShowTask,
    CreateTask,
    UpdateTask,
    ChangeTaskStatus,
    DeleteTask,
}

pub fn map_routes() -> Result<RouteTable<Endpoint>, RouteError> {
    Ok(RouteTable::new()
        .merge(task_routes::get_router()?))
}
