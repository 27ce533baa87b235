use std::sync::Arc;

use crate::{
    data_access::{data_context::DataContext, task_repository::TaskRepository},
    settings::Settings,
    web_api::{
        router::{RouteError, RouteTable},
        routes::Endpoint,
    },
};

/// Everything a request may touch. Built once at startup, read-only afterwards.
pub struct AppState {
    pub tasks: TaskRepository,
    pub routes: RouteTable<Endpoint>,
    pub settings: Settings,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, RouteError> {
        let data_context = DataContext::new(settings.database.clone());
        Ok(AppState {
            tasks: TaskRepository::new(data_context),
            routes: crate::map_routes()?,
            settings,
        })
    }

    pub fn shared(settings: Settings) -> Result<SharedState, RouteError> {
        Self::new(settings).map(Arc::new)
    }
}
