//! Order read API and catalog administration
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders/{id} | GET | 订单 |
//! | /api/orders/{id}/states | GET | 状态历史 |
//! | /api/orders/{id}/lines | GET | 订单行 |
//! | /api/orders/{id}/operations | GET | 操作日志 |
//! | /api/orders/{id}/return-recap | GET | 退货状况汇总 |
//! | /api/orders/{id}/resends | GET | 补发订单 |
//! | /api/articles | POST | 新增/更新商品 |
//! | /api/articles/{id} | GET | 商品 |
//! | /api/articles/{id}/movements | GET | 库存流水 |
//! | /api/operators | POST | 登记操作员 |
//!
//! All mutations of orders go through `/api/commands`.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult};
use shared::models::{Article, Operation, Operator, StockMovement};
use shared::order::{LineItem, Order, ReturnConditionRecap, StateInstance};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/states", get(state_history))
        .route("/api/orders/{id}/lines", get(line_items))
        .route("/api/orders/{id}/operations", get(operations))
        .route("/api/orders/{id}/return-recap", get(return_recap))
        .route("/api/orders/{id}/resends", get(resends))
        .route("/api/articles", post(upsert_article))
        .route("/api/articles/{id}", get(get_article))
        .route("/api/articles/{id}/movements", get(stock_movements))
        .route("/api/operators", post(register_operator))
}

/// Order with its current and previous meaningful state
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub current_state: Option<StateInstance>,
    pub previous_state: Option<StateInstance>,
}

pub async fn get_order(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<OrderDetail>> {
    let manager = state.manager();
    let order = manager
        .get_order(id)?
        .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;
    Ok(ApiResponse::success(OrderDetail {
        current_state: manager.current_state(id)?,
        previous_state: manager.previous_state(id)?,
        order,
    }))
}

pub async fn state_history(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<Vec<StateInstance>>> {
    Ok(ApiResponse::success(state.manager().state_history(id)?))
}

pub async fn line_items(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<Vec<LineItem>>> {
    Ok(ApiResponse::success(state.manager().line_items(id)?))
}

pub async fn operations(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<Vec<Operation>>> {
    Ok(ApiResponse::success(state.manager().operations_for_order(id)?))
}

pub async fn return_recap(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<ReturnConditionRecap>> {
    Ok(ApiResponse::success(state.manager().return_condition_recap(id)?))
}

pub async fn resends(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<Vec<Order>>> {
    Ok(ApiResponse::success(state.manager().find_resend_orders(id)?))
}

pub async fn upsert_article(
    State(state): State<ServerState>,
    Json(article): Json<Article>,
) -> AppResult<ApiResponse<Article>> {
    let saved = state.manager().upsert_article(article)?;
    Ok(ApiResponse::success_with_message(
        format!("Article {} saved", saved.id),
        saved,
    ))
}

pub async fn get_article(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Article>> {
    let article = state
        .manager()
        .get_article(id)?
        .ok_or_else(|| AppError::not_found(format!("Article {}", id)))?;
    Ok(ApiResponse::success(article))
}

pub async fn stock_movements(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Vec<StockMovement>>> {
    Ok(ApiResponse::success(state.manager().stock_movements_for(id)?))
}

pub async fn register_operator(
    State(state): State<ServerState>,
    Json(operator): Json<Operator>,
) -> AppResult<ApiResponse<Operator>> {
    state.manager().register_operator(operator.clone())?;
    Ok(ApiResponse::success_with_message(
        format!("Operator {} registered", operator.id),
        operator,
    ))
}
