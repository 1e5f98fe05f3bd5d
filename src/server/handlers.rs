//! # 管理端点处理器

use super::AppState;
use crate::error::ProxyError;
use crate::logging::{LogComponent, LogStage, SYSTEM};
use crate::request::RawRegisterRequest;
use crate::{linfo, types::ModelId};
use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// POST /model/register
pub async fn register_model(
    State(state): State<AppState>,
    body: Result<Json<RawRegisterRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let Json(raw) = match body {
        Ok(body) => body,
        Err(e) => {
            return ProxyError::validation(e.body_text()).into_response();
        }
    };

    let model = match raw.parse() {
        Ok(model) => model,
        Err(e) => return e.into_response(),
    };

    let name = model.name.to_string();
    let model_id = model.model.to_string();
    let api_url = model.api_url.to_string();

    if let Err(e) = state.registry.register(model) {
        return e.into_response();
    }

    linfo!(
        SYSTEM,
        LogStage::Configuration,
        LogComponent::Registry,
        "register",
        format!("模型已注册: {name} -> {model_id} @ {api_url}")
    );

    Json(json!({
        "status": "model registered",
        "name": name,
        "model": model_id,
    }))
    .into_response()
}

/// GET /model/list
pub async fn list_models(State(state): State<AppState>) -> Response {
    let models: Vec<_> = state
        .registry
        .list()
        .into_iter()
        .map(|m| {
            json!({
                "name": m.name.as_str(),
                "model": m.model.as_str(),
                "api_url": m.api_url.as_str(),
                "provider": m.provider.as_str(),
                "status": m.status.as_str(),
                "registered_at": m.created_at.to_rfc3339(),
            })
        })
        .collect();

    Json(json!({ "models": models })).into_response()
}

/// GET /model/list/providers
pub async fn list_providers(State(state): State<AppState>) -> Response {
    let providers: Vec<_> = state
        .providers
        .all()
        .iter()
        .map(|entry| {
            json!({
                "provider": entry.provider.as_str(),
                "models": entry.models.iter().map(ModelId::as_str).collect::<Vec<_>>(),
                "api_url": entry.api_url.as_str(),
            })
        })
        .collect();

    Json(json!({ "providers": providers })).into_response()
}

/// GET /health
pub async fn health() -> Response {
    Json(json!({ "status": "healthy" })).into_response()
}
