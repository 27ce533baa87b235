use axum::http::Method;

use crate::web_api::{
    router::{RouteError, RouteTable},
    routes::Endpoint,
};

pub const ROUTER_PATH: &str = "/tasks";
pub const CHANGE_STATUS_PATH: &str = "/tasks-change-status";

pub fn get_router() -> Result<RouteTable<Endpoint>, RouteError> {
    RouteTable::new()
        .route(Method::GET, ROUTER_PATH, Endpoint::ListTasks)?
        .route(Method::GET, format!("{}/{{id}}", ROUTER_PATH).as_str(), Endpoint::ShowTask)?
        .route(Method::POST, ROUTER_PATH, Endpoint::CreateTask)?
        .route(Method::PUT, format!("{}/{{id}}", ROUTER_PATH).as_str(), Endpoint::UpdateTask)?
        .route(Method::PUT, format!("{}/{{id}}", CHANGE_STATUS_PATH).as_str(), Endpoint::ChangeTaskStatus)?
        .route(Method::DELETE, format!("{}/{{id}}", ROUTER_PATH).as_str(), Endpoint::DeleteTask)
}
