//! Operator API, served on its own listener.
//!
//! - `GET /admin/status`: version, backend configured, operation count
//! - `GET /admin/operations`: the live operation table

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/operations", get(get_operations))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::GatewayConfig;
    use crate::http::server::GatewayState;

    fn admin_router(base_url: Option<&str>) -> Router {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = "s3cret".into();
        config.backend.base_url = base_url.map(String::from);
        let state = AppState::new(GatewayState::from_config(config).unwrap());
        setup_admin_router(state)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_missing_or_wrong_key() {
        let router = admin_router(None);

        let response = router.clone().oneshot(get("/admin/status", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router.oneshot(get("/admin/status", Some("nope"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status_reports_backend_configuration() {
        let response = admin_router(None)
            .oneshot(get("/admin/status", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "operational");
        assert_eq!(body["backend_configured"], false);

        let response = admin_router(Some("http://backend:4000"))
            .oneshot(get("/admin/status", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(json(response).await["backend_configured"], true);
    }

    #[tokio::test]
    async fn test_operations_listing() {
        let response = admin_router(None)
            .oneshot(get("/admin/operations", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        let delete = body
            .as_array()
            .unwrap()
            .iter()
            .find(|op| op["name"] == "delete-category")
            .unwrap();
        assert_eq!(delete["inbound_method"], "DELETE");
        assert_eq!(delete["outbound_method"], "POST");
        assert_eq!(delete["backend_path"], "/categories/{id}/delete");
    }
}
