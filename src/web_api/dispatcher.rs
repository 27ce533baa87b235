//! Front controller. OPTIONS requests are answered by the CORS layer before
//! routing. Every other request lands in [`dispatch`], which resolves the
//! route, decodes the body and turns the handler outcome into exactly one
//! response.

use std::any::Any as PanicPayload;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{Map, Value};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    app_state::SharedState,
    task_controller::TaskController,
    web_api::{
        api_error::ApiError,
        controllers::RequestContext,
        resource_resolver::ResourceResolver,
        router::normalize_path,
        routes::Endpoint,
    },
};

const ALLOWED_METHODS: [Method; 5] = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
const ALLOWED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::AUTHORIZATION];

pub fn build_app(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS);

    // CorsLayer only lists methods and headers on preflight responses.
    let allow_methods = SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    let allow_headers = SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );

    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(allow_methods)
        .layer(allow_headers)
}

pub async fn dispatch(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mount_path = state.settings.mount_path.as_str();
    let path = normalize_path(uri.path(), mount_path);
    let Some(found) = state.routes.resolve(&method, &path) else {
        tracing::debug!(%method, %path, "no route");
        return ApiError::EndpointNotFound.into_response();
    };
    tracing::debug!(%method, %path, endpoint = ?found.handler, "routed");

    let request = RequestContext {
        params: found.params,
        input: parse_body(&body),
        resolver: ResourceResolver::from_request(&uri, &headers, mount_path),
    };

    let outcome = match found.handler {
        Endpoint::ListTasks => TaskController::index(&state, request).await,
        Endpoint::ShowTask => TaskController::show(&state, request).await,
        Endpoint::CreateTask => TaskController::store(&state, request).await,
        Endpoint::UpdateTask => TaskController::update(&state, request).await,
        Endpoint::ChangeTaskStatus => TaskController::change_status(&state, request).await,
        Endpoint::DeleteTask => TaskController::destroy(&state, request).await,
    };
    outcome.unwrap_or_else(|error| error.into_response())
}

/// Anything that is not a JSON object, including an empty or malformed body,
/// decodes to an empty map.
fn parse_body(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn handle_panic(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Internal server error".to_string()
    };
    ApiError::Internal(detail).into_response()
}
