use axum::Router;
use tower_http::cors::{Any, CorsLayer};

/// Any origin, method and header: the dashboard is served from other hosts.
pub fn add_cors(router: Router) -> Router {
    router.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
