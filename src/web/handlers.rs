//! HTTP request handlers.

use super::AppState;
use crate::store::{Bot, StoreError, Visitor};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ============================================================================
// Templates (simple string replacement)
// ============================================================================

const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");
const ADMIN_TEMPLATE: &str = include_str!("templates/admin.html");
const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");

// ============================================================================
// API: Bots
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BotsResponse {
    pub bots: Vec<Bot>,
}

#[derive(Debug, Serialize)]
pub struct BotResponse {
    pub bot: Bot,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBotRequest {
    pub status: String,
}

pub async fn handle_get_bots(State(state): State<AppState>) -> impl IntoResponse {
    Json(BotsResponse {
        bots: state.store.list_bots(),
    })
}

pub async fn handle_update_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBotRequest>,
) -> impl IntoResponse {
    match state.store.update_bot(&id, &req.status) {
        Ok(bot) => Json(BotResponse { bot }).into_response(),
        Err(e @ StoreError::InvalidStatus(_)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e @ StoreError::BotNotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

// ============================================================================
// API: Visitors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VisitorsResponse {
    pub visitors: Vec<Visitor>,
}

pub async fn handle_get_visitors(State(state): State<AppState>) -> impl IntoResponse {
    Json(VisitorsResponse {
        visitors: state.store.list_visitors(),
    })
}

// ============================================================================
// API: Ping
// ============================================================================

pub async fn handle_ping(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "message": state.config.ping_message }))
}

// ============================================================================
// Pages
// ============================================================================

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let bots = state.store.list_bots();
    let bots_json = serde_json::to_string(&bots).unwrap_or_else(|_| "[]".to_string());

    let content = DASHBOARD_TEMPLATE.replace("{{bots_json}}", &bots_json);

    let page = LAYOUT_TEMPLATE
        .replace("{{title}}", "Bot Status")
        .replace("{{content}}", &content);

    Html(page)
}

pub async fn handle_admin() -> impl IntoResponse {
    // Status changes go through the API; the access-code gate lives entirely
    // in the page.
    let page = LAYOUT_TEMPLATE
        .replace("{{title}}", "Admin - Bot Status")
        .replace("{{content}}", ADMIN_TEMPLATE);

    Html(page)
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_favicon() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <circle cx="50" cy="50" r="45" fill="#1f2633"/>
        <circle cx="50" cy="50" r="18" fill="#4caf50"/>
    </svg>"##;

    (
        [(axum::http::header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    )
}
