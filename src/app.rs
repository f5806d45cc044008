use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::{get, post},
    Router,
};
use tower::util::MapRequest;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::handlers::{self, listings, reviews, system, users};
use crate::images::local::UPLOADS_PATH;
use crate::middleware::method_override;
use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = "public";

/// The router wrapped in method override, ready for `axum::serve`.
pub type AppService = MapRequest<Router, fn(Request) -> Request>;

pub fn service(state: AppState) -> AppService {
    MapRequest::new(app(state), method_override as fn(Request) -> Request)
}

pub fn app(state: AppState) -> Router {
    let upload_dir = state.config.storage.upload_dir.clone();
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(system::root).fallback(handlers::not_found))
        .route("/health", get(system::health).fallback(handlers::not_found))
        .merge(listing_routes())
        .merge(user_routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .nest_service(UPLOADS_PATH, ServeDir::new(upload_dir))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Unsupported methods on known paths fall through to the 404 page as well.
fn listing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/listings",
            get(listings::index).post(listings::create).fallback(handlers::not_found),
        )
        .route("/listing/new", get(listings::new_form).fallback(handlers::not_found))
        .route(
            "/listings/:id",
            get(listings::show)
                .put(listings::update)
                .delete(listings::destroy)
                .fallback(handlers::not_found),
        )
        .route("/listings/:id/edit", get(listings::edit_form).fallback(handlers::not_found))
        .route("/listings/:id/reviews", post(reviews::create).fallback(handlers::not_found))
        .route(
            "/listings/:id/reviews/:review_id",
            axum::routing::delete(reviews::destroy).fallback(handlers::not_found),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/signup",
            get(users::signup_form).post(users::signup).fallback(handlers::not_found),
        )
        .route(
            "/login",
            get(users::login_form).post(users::login).fallback(handlers::not_found),
        )
        .route("/logout", get(users::logout).fallback(handlers::not_found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::MemoryStore;
    use crate::images::LocalImageStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, StatusCode},
        response::Response,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    const TEST_HASH_COST: u32 = 4;

    fn state(upload_dir: &std::path::Path) -> AppState {
        let mut config = AppConfig::development();
        config.security.password_hash_cost = TEST_HASH_COST;
        config.storage.upload_dir = upload_dir.to_path_buf();
        AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(LocalImageStore::new(upload_dir)),
        )
    }

    async fn send(state: AppState, method: Method, uri: &str) -> Response {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        service(state).oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn root_redirects_to_index() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(state(dir.path()), Method::GET, "/").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/listings");
    }

    #[tokio::test]
    async fn unknown_path_renders_not_found_page() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(state(dir.path()), Method::GET, "/nonexistent").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page Not Found"));
    }

    #[tokio::test]
    async fn unsupported_method_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(state(dir.path()), Method::PATCH, "/listings").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn index_renders_for_anonymous_visitors() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(state(dir.path()), Method::GET, "/listings").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response).await.contains("listing-grid"));
    }

    #[tokio::test]
    async fn overridden_delete_reaches_the_auth_gate() {
        let dir = tempfile::tempdir().unwrap();
        let id = uuid::Uuid::new_v4();
        let response = send(state(dir.path()), Method::POST, &format!("/listings/{id}?_method=DELETE")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn health_reports_store_status() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(state(dir.path()), Method::GET, "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["data"]["database"], "ok");
    }

    #[tokio::test]
    async fn serves_uploaded_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();

        let response = send(state(dir.path()), Method::GET, "/uploads/a.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "png");
    }
}
