use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::api::client::client_id;
use crate::errors::AppError;
use crate::explorer::{ExplorerSettings, ExplorerState, FilterContext, FilterTab, QueryParams};
use crate::filters::ConditionRow;
use crate::models::LayoutState;
use crate::AppState;

use super::ApiResponse;

/// Resolve the explorer state for `query` in the caller's namespace.
pub(crate) async fn load_context(state: &AppState, client: String, query: &str) -> FilterContext {
    FilterContext::load(
        QueryParams::parse(query),
        client,
        Arc::clone(&state.filter_store),
        ExplorerSettings::from(&state.config),
        Utc::now(),
    )
    .await
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ChangeFiltersRequest {
    #[serde(default)]
    pub query: String,
    pub tab: FilterTab,
    pub filters: Vec<ConditionRow>,
}

#[derive(Deserialize)]
pub struct ChangeTabRequest {
    #[serde(default)]
    pub query: String,
    pub tab: FilterTab,
}

#[derive(Deserialize)]
pub struct ChangeLabelsRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub if_labels: Vec<String>,
}

#[derive(Deserialize)]
pub struct ChangePageRequest {
    #[serde(default)]
    pub query: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/explorer/state: resolved state for the current query string
pub async fn state(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Json<ApiResponse<ExplorerState>> {
    let ctx = load_context(&state, client_id(&headers), query.as_deref().unwrap_or_default()).await;
    Json(ApiResponse::ok(ctx.snapshot()))
}

/// POST /api/explorer/filters: replace a tab's rows
pub async fn change_filters(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChangeFiltersRequest>,
) -> Result<Json<ApiResponse<ExplorerState>>, AppError> {
    let mut ctx = load_context(&state, client_id(&headers), &body.query).await;
    ctx.change_filters(body.filters, body.tab).await?;

    Ok(Json(ApiResponse::ok(ctx.snapshot())))
}

/// POST /api/explorer/tab: switch filter mode
pub async fn change_tab(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChangeTabRequest>,
) -> Json<ApiResponse<ExplorerState>> {
    let mut ctx = load_context(&state, client_id(&headers), &body.query).await;
    ctx.change_tab(body.tab);

    Json(ApiResponse::ok(ctx.snapshot()))
}

/// POST /api/explorer/labels: filter by labels
pub async fn change_labels(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChangeLabelsRequest>,
) -> Json<ApiResponse<ExplorerState>> {
    let mut ctx = load_context(&state, client_id(&headers), &body.query).await;
    ctx.change_labels(body.labels, body.if_labels);

    Json(ApiResponse::ok(ctx.snapshot()))
}

/// POST /api/explorer/page: change page and/or page size
pub async fn change_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChangePageRequest>,
) -> Json<ApiResponse<ExplorerState>> {
    let mut ctx = load_context(&state, client_id(&headers), &body.query).await;
    if let Some(limit) = body.limit {
        ctx.change_limit(limit);
    }
    if let Some(page) = body.page {
        ctx.change_page(page);
    }

    Json(ApiResponse::ok(ctx.snapshot()))
}

/// GET /api/explorer/layout
pub async fn get_layout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiResponse<LayoutState>> {
    let ctx = load_context(&state, client_id(&headers), "").await;
    Json(ApiResponse::ok(ctx.load_layout().await))
}

/// PUT /api/explorer/layout
pub async fn put_layout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(layout): Json<LayoutState>,
) -> Result<Json<ApiResponse<LayoutState>>, AppError> {
    let ctx = load_context(&state, client_id(&headers), "").await;
    ctx.save_layout(&layout).await?;

    Ok(Json(ApiResponse::ok(layout)))
}
