//---------------------------------------
pub mod web_api {
    pub mod router;
    pub mod routes;
    pub mod controllers;
    pub mod dispatcher;
    pub mod resource_resolver;
    pub mod api_error;
}

pub use web_api::routes::map_routes;
pub use web_api::controllers::*;
pub use web_api::dispatcher::build_app;
//---------------------------------------

//---------------------------------------
pub mod shared {
    pub mod models;
    pub mod dto;
}

pub use shared::models::*;
pub use shared::dto::*;
//---------------------------------------

//---------------------------------------
pub mod data_access {
    pub mod data_context;
    pub mod task_repository;
}
//---------------------------------------
