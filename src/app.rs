use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::identity_middleware;
use crate::state::AppState;

/// Full router: public health routes, protected API, then the global layers
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    let router = match cors_layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/ping", get(public::ping))
        .route("/health", get(public::health))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/create_user", post(protected::create_user))
        .route("/update_user/:uid", put(protected::update_user))
        .route("/search_replacements", post(protected::search_replacements))
        .route("/send_message", post(protected::send_message))
        .route(
            "/delete_message/:conversation_id/:message_id",
            delete(protected::delete_message),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, identity_middleware))
}

/// `*` allows any origin; otherwise only the listed origins are accepted
fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
