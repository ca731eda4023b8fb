use axum::extract::{Path, RawQuery, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::api::client::client_id;
use crate::db::trader_repo;
use crate::errors::AppError;
use crate::models::{Trader, TraderPage};
use crate::AppState;

use super::explorer::load_context;
use super::ApiResponse;

#[derive(Serialize)]
pub struct TraderCount {
    pub total: i64,
}

/// GET /api/traders: one page of traders for the explorer query string
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<TraderPage>>, AppError> {
    let ctx = load_context(&state, client_id(&headers), query.as_deref().unwrap_or_default()).await;
    let trader_query = ctx.trader_query();

    let traders = trader_repo::search_traders(&state.db, &trader_query).await?;

    Ok(Json(ApiResponse::ok(TraderPage {
        traders,
        page: trader_query.page,
        limit: trader_query.limit,
    })))
}

/// GET /api/traders/count: number of traders matching the query string
pub async fn count(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<TraderCount>>, AppError> {
    let ctx = load_context(&state, client_id(&headers), query.as_deref().unwrap_or_default()).await;
    let total = trader_repo::count_traders(&state.db, &ctx.trader_query()).await?;

    Ok(Json(ApiResponse::ok(TraderCount { total })))
}

/// GET /api/accounts/{account}: trader detail
pub async fn detail(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<ApiResponse<Trader>>, AppError> {
    let trader = trader_repo::get_trader_by_account(&state.db, &account)
        .await?
        .ok_or_else(|| AppError::NotFound("trader not found".into()))?;

    Ok(Json(ApiResponse::ok(trader)))
}
