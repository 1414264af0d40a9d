use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use installm_core::{ModelEntry, Turn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelEntry>,
    pub selected: Option<String>,
    pub loaded: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub model: String,
    pub turns: Vec<Turn>,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Rescans the models directory; the page calls this on every load.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state.refresh().await;
    let selected = models.first().map(|m| m.name.clone());
    Json(ModelsResponse {
        models,
        selected,
        loaded: state.loaded_models().await,
    })
}

pub async fn load_model(
    State(state): State<AppState>,
    Json(req): Json<ModelRequest>,
) -> Json<MessageResponse> {
    let model = req.model.unwrap_or_default();
    info!("Load requested for {:?}", model);
    Json(MessageResponse {
        message: state.load(&model).await,
    })
}

pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Json<GenerateResponse> {
    let model = req.model.unwrap_or_default();
    Json(GenerateResponse {
        response: state.generate(&model, &req.prompt).await,
    })
}

pub async fn history(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Json<HistoryResponse> {
    let turns = state.history(&model).await;
    Json(HistoryResponse { model, turns })
}

pub async fn reset(
    State(state): State<AppState>,
    Json(req): Json<ModelRequest>,
) -> Json<MessageResponse> {
    let model = req.model.unwrap_or_default();
    Json(MessageResponse {
        message: state.reset(&model).await,
    })
}

pub async fn unload(
    State(state): State<AppState>,
    Json(req): Json<ModelRequest>,
) -> Json<MessageResponse> {
    let model = req.model.unwrap_or_default();
    Json(MessageResponse {
        message: state.unload(&model).await,
    })
}
