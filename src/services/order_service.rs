use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, DbErr, EntityTrait, Set, TransactionTrait,
    ActiveValue::NotSet, sea_query::OnConflict,
};
use sqlx::FromRow;
use tokio::time::{Instant, timeout_at};

use crate::{
    audit,
    dto::orders::{NewLineItem, NewOrder},
    entity::{
        order_items::ActiveModel as OrderItemActive,
        orders::ActiveModel as OrderActive,
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{OrderId, OrderLine, OrderStatus, OrderSummary, UserId},
    state::AppState,
};

/// Persist `order` and its line items in one transaction and return the new order id.
///
/// Products referenced by a line item but missing from the catalog are created
/// on the fly from the line item's name and price (zero when absent). Either
/// every row of the order becomes visible or none does; store failures and
/// timeouts are reported as persistence errors after the rollback.
pub async fn submit_order(state: &AppState, order: NewOrder) -> AppResult<OrderId> {
    let order_id = place_order(state, &order).await?;

    tracing::info!(
        order_id,
        user_id = order.user_id,
        items = order.line_items.len(),
        total = %order.total,
        "order placed"
    );

    audit::record(
        &state.pool,
        Some(order.user_id),
        "order_placed",
        "orders",
        serde_json::json!({ "order_id": order_id, "total": order.total }),
    )
    .await;

    Ok(order_id)
}

/// Run the writes under the configured deadline. The commit itself is not
/// timed: once the writes are done, dropping a pending commit would leave the
/// outcome unknown to the caller.
async fn place_order(state: &AppState, order: &NewOrder) -> AppResult<OrderId> {
    let timeout = state.config.order_timeout;
    let deadline = Instant::now() + timeout;
    let timed_out = || {
        tracing::error!(
            user_id = order.user_id,
            timeout_ms = timeout.as_millis() as u64,
            "order transaction timed out"
        );
        AppError::Timeout
    };

    let txn = timeout_at(deadline, state.orm.begin())
        .await
        .map_err(|_| timed_out())??;

    let written = timeout_at(deadline, write_order(&txn, order, state.config.strict_totals)).await;
    let outcome = match written {
        Ok(Ok(order_id)) => {
            txn.commit().await?;
            return Ok(order_id);
        }
        Ok(Err(err)) => err,
        Err(_) => timed_out(),
    };

    if let Err(rollback_err) = txn.rollback().await {
        tracing::error!(error = %rollback_err, "rollback failed");
    }
    tracing::warn!(user_id = order.user_id, error = %outcome, "order rolled back");
    Err(outcome)
}

async fn write_order(
    txn: &DatabaseTransaction,
    order: &NewOrder,
    strict_totals: bool,
) -> AppResult<OrderId> {
    let header = OrderActive {
        id: NotSet,
        user_id: Set(order.user_id),
        total: Set(order.total),
        address: Set(order.address.clone()),
        status: Set(OrderStatus::Pending.as_str().into()),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;

    let mut computed_total = Decimal::ZERO;
    for item in &order.line_items {
        let catalog_price = ensure_product(txn, item).await?;
        let price = item.price.unwrap_or(catalog_price);
        computed_total = price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line_total| computed_total.checked_add(line_total))
            .ok_or_else(|| AppError::Validation("order total overflows".into()))?;

        OrderItemActive {
            id: NotSet,
            order_id: Set(header.id),
            product_id: Set(item.product_id.clone()),
            quantity: Set(item.quantity),
            name: Set(item.name.clone()),
            price: Set(price),
        }
        .insert(txn)
        .await?;
    }

    if strict_totals && computed_total != order.total {
        return Err(AppError::Validation(format!(
            "total {} does not match line items ({computed_total})",
            order.total
        )));
    }

    Ok(header.id)
}

/// Return the catalog price of the line item's product, creating the product
/// first when it is unknown.
async fn ensure_product(txn: &DatabaseTransaction, item: &NewLineItem) -> Result<Decimal, DbErr> {
    if let Some(product) = Products::find_by_id(item.product_id.clone()).one(txn).await? {
        return Ok(product.price);
    }

    let price = item.price.unwrap_or(Decimal::ZERO);
    tracing::debug!(product_id = %item.product_id, %price, "backfilling unknown product");

    let inserted = Products::insert(ProductActive {
        id: Set(item.product_id.clone()),
        name: Set(item.name.clone()),
        price: Set(price),
        created_at: NotSet,
    })
    .on_conflict(OnConflict::column(ProdCol::Id).do_nothing().to_owned())
    .exec_without_returning(txn)
    .await?;

    if inserted == 1 {
        return Ok(price);
    }

    // Another transaction created the product after our lookup; its row is
    // committed by the time the conflicting insert returns.
    tracing::debug!(product_id = %item.product_id, "product created concurrently");
    Products::find_by_id(item.product_id.clone())
        .one(txn)
        .await?
        .map(|product| product.price)
        .ok_or_else(|| DbErr::RecordNotFound(format!("product {}", item.product_id)))
}

/// Flat row of the order/line-item join used by the history queries.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub total: Decimal,
    pub address: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
}

/// Fold joined rows into one summary per order, keeping the order in which
/// orders and their line items first appear.
pub fn group_order_rows(rows: Vec<OrderRow>) -> Vec<OrderSummary> {
    let mut orders: Vec<OrderSummary> = Vec::new();

    for row in rows {
        let position = match orders.iter().rposition(|o| o.order_id == row.order_id) {
            Some(position) => position,
            None => {
                let status = row.status.parse().unwrap_or_else(|err| {
                    tracing::warn!(order_id = row.order_id, error = %err, "defaulting status");
                    OrderStatus::Pending
                });
                orders.push(OrderSummary {
                    order_id: row.order_id,
                    total: row.total,
                    address: row.address,
                    status,
                    created_at: row.created_at,
                    products: Vec::new(),
                });
                orders.len() - 1
            }
        };

        if let (Some(product_id), Some(quantity)) = (row.product_id, row.quantity) {
            orders[position].products.push(OrderLine {
                product_id,
                product_name: row.product_name.unwrap_or_default(),
                quantity,
                price: row.price.unwrap_or_default(),
            });
        }
    }

    orders
}

const ORDER_ROWS_SQL: &str = r#"
    SELECT o.id AS order_id, o.total, o.address, o.status, o.created_at,
           oi.product_id, oi.name AS product_name, oi.quantity, oi.price
    FROM orders o
    LEFT JOIN order_items oi ON oi.order_id = o.id
    WHERE o.user_id = $1
"#;

/// Order history of `user_id`, newest first. No orders is an empty list.
pub async fn list_orders_for_user(state: &AppState, user_id: UserId) -> AppResult<Vec<OrderSummary>> {
    let sql = format!("{ORDER_ROWS_SQL} ORDER BY o.created_at DESC, o.id DESC, oi.id ASC");
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(user_id)
        .fetch_all(&state.pool)
        .await?;

    Ok(group_order_rows(rows))
}

pub async fn get_order_for_user(
    state: &AppState,
    user_id: UserId,
    order_id: OrderId,
) -> AppResult<OrderSummary> {
    let sql = format!("{ORDER_ROWS_SQL} AND o.id = $2 ORDER BY oi.id ASC");
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(user_id)
        .bind(order_id)
        .fetch_all(&state.pool)
        .await?;

    group_order_rows(rows)
        .into_iter()
        .next()
        .ok_or(AppError::NotFound)
}
