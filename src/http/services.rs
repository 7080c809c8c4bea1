//! Registry endpoints: self-registration, push health reports, introspection.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::health::{apply_report, HealthReport};
use crate::http::server::AppState;
use crate::registry::{Instance, InstanceId};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub id: InstanceId,
    pub name: String,
    pub url: String,
}

/// One row of `GET /services` and of the gateway's own `/health`:
/// `{name, id, url, isHealthy, lastHealthCheck, consecutiveFailures}`.
#[derive(Debug, Serialize)]
pub struct ServiceEntry {
    pub name: String,
    #[serde(flatten)]
    pub instance: Instance,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnswer {
    pub is_healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct GatewayHealth {
    pub status: &'static str,
    pub services: Vec<ServiceEntry>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// `POST /services/register`
pub async fn register_service(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return state
                .api_error(GatewayError::InvalidRequest(rejection.body_text()))
                .into_response()
        }
    };

    let Some(name) = non_empty(request.name) else {
        return state.api_error(GatewayError::MissingField("name")).into_response();
    };
    let Some(url) = non_empty(request.url) else {
        return state.api_error(GatewayError::MissingField("url")).into_response();
    };

    match state.registry.register(&name, &url) {
        Ok(id) => {
            let url = state
                .registry
                .get(&name)
                .and_then(|g| g.instances.into_iter().find(|i| i.id == id))
                .map(|i| i.base_url)
                .unwrap_or(url);
            (
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message: "Service registered",
                    id,
                    name,
                    url,
                }),
            )
                .into_response()
        }
        Err(e) => state.api_error(e).into_response(),
    }
}

/// `POST /services/health/{name}`
pub async fn report_health(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<HealthReport>, JsonRejection>,
) -> Response {
    let Json(report) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return state
                .api_error(GatewayError::InvalidRequest(rejection.body_text()))
                .into_response()
        }
    };

    match apply_report(&state.registry, &name, &report) {
        Ok(updated) => Json(serde_json::json!({
            "message": "Health status updated",
            "name": name,
            "isHealthy": report.is_healthy(),
            "updated": updated,
        }))
        .into_response(),
        Err(e) => state.api_error(e).into_response(),
    }
}

/// `DELETE /services/{name}/{id}`
pub async fn unregister_service(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Response {
    let id: InstanceId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return state
                .api_error(GatewayError::InvalidRequest(format!("invalid instance id '{}'", id)))
                .into_response()
        }
    };
    state.registry.unregister(&name, id);
    StatusCode::NO_CONTENT.into_response()
}

/// `GET /services`
pub async fn list_services(State(state): State<AppState>) -> Json<Vec<ServiceEntry>> {
    Json(service_entries(&state))
}

/// `GET /services/{name}/health`, probing the group now.
pub async fn check_service_health(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<HealthAnswer> {
    let is_healthy = state.monitor.probe_service(&name).await.unwrap_or(false);
    Json(HealthAnswer { is_healthy })
}

/// `GET /health`, the gateway's own liveness.
pub async fn gateway_health(State(state): State<AppState>) -> Json<GatewayHealth> {
    Json(GatewayHealth {
        status: "ok",
        services: service_entries(&state),
    })
}

fn service_entries(state: &AppState) -> Vec<ServiceEntry> {
    state
        .registry
        .list_all()
        .into_values()
        .flat_map(|group| {
            let name = group.name;
            group.instances.into_iter().map(move |instance| ServiceEntry {
                name: name.clone(),
                instance,
            })
        })
        .collect()
}
