use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub backend_configured: bool,
    pub operations: usize,
}

#[derive(Debug, Serialize)]
pub struct OperationSummary {
    pub name: String,
    pub route: String,
    pub inbound_method: String,
    pub outbound_method: String,
    pub backend_path: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = state.inner.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        backend_configured: inner.resolver.base_url().is_some(),
        operations: inner.resolver.operations().count(),
    })
}

pub async fn get_operations(State(state): State<AppState>) -> Json<Vec<OperationSummary>> {
    let inner = state.inner.load();
    let operations = inner
        .resolver
        .operations()
        .map(|op| OperationSummary {
            name: op.name.clone(),
            route: op.route.to_string(),
            inbound_method: op.inbound_method.to_string(),
            outbound_method: op.outbound_method.to_string(),
            backend_path: op.backend_path.to_string(),
        })
        .collect();

    Json(operations)
}
