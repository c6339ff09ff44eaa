use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::orders::{NewOrder, OrderCreated, SubmitOrderRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_caller},
    models::{OrderId, OrderSummary},
    response::{ApiResponse, Meta},
    routes::json_body,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(submit_order))
        .route("/{id}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = SubmitOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderCreated>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "No token"),
        (status = 403, description = "Invalid token or foreign user_id"),
        (status = 500, description = "Persistence error, nothing was stored"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn submit_order(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderCreated>>)> {
    let order = NewOrder::try_from(json_body(payload)?)?;
    ensure_caller(&user, order.user_id)?;

    let order_id = order_service::submit_order(&state, order).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Order created",
            OrderCreated { order_id },
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Order history, newest first", body = ApiResponse<Vec<OrderSummary>>),
        (status = 401, description = "No token"),
        (status = 403, description = "Invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<OrderSummary>>>> {
    let orders = order_service::list_orders_for_user(&state, user.user_id).await?;
    let meta = Meta::count(orders.len());
    Ok(Json(ApiResponse::success("Ok", orders, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its line items", body = ApiResponse<OrderSummary>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<OrderId>,
) -> AppResult<Json<ApiResponse<OrderSummary>>> {
    let order = order_service::get_order_for_user(&state, user.user_id, id).await?;
    Ok(Json(ApiResponse::success("OK", order, Some(Meta::empty()))))
}
