mod common;

use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_api::{
    dto::orders::{NewLineItem, NewOrder},
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        products::Entity as Products,
    },
    error::AppError,
    models::{OrderStatus, UserId},
    services::order_service::{get_order_for_user, list_orders_for_user, submit_order},
    state::AppState,
};

fn line(product_id: &str, quantity: i32, price: Option<i64>) -> NewLineItem {
    NewLineItem {
        product_id: product_id.to_string(),
        quantity,
        name: format!("name of {product_id}"),
        price: price.map(Decimal::from),
    }
}

fn order(user_id: UserId, total: i64, line_items: Vec<NewLineItem>) -> NewOrder {
    NewOrder {
        user_id,
        total: Decimal::from(total),
        address: "Cotonou".into(),
        line_items,
    }
}

async fn order_count(state: &AppState, user_id: UserId) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}

async fn item_count(state: &AppState, user_id: UserId) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM order_items oi JOIN orders o ON o.id = oi.order_id WHERE o.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(count)
}

#[tokio::test]
async fn submits_order_and_backfills_unknown_product() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user_id = common::create_user(&state.pool).await?;
    let shoe = common::fresh_product_id("shoe");

    let order_id = submit_order(&state, order(user_id, 150, vec![line(&shoe, 2, Some(75))])).await?;

    assert_eq!(order_count(&state, user_id).await?, 1);
    assert_eq!(item_count(&state, user_id).await?, 1);

    let product = Products::find_by_id(shoe.clone())
        .one(&state.orm)
        .await?
        .expect("backfilled product");
    assert_eq!(product.price, Decimal::from(75));
    assert_eq!(product.name, format!("name of {shoe}"));

    let placed = get_order_for_user(&state, user_id, order_id).await?;
    assert_eq!(placed.total, Decimal::from(150));
    assert_eq!(placed.status, OrderStatus::Pending);
    assert_eq!(placed.products.len(), 1);
    assert_eq!(placed.products[0].product_id, shoe);
    assert_eq!(placed.products[0].quantity, 2);
    assert_eq!(placed.products[0].price, Decimal::from(75));

    let audits = AuditLogs::find()
        .filter(AuditCol::UserId.eq(user_id))
        .filter(AuditCol::Action.eq("order_placed"))
        .count(&state.orm)
        .await?;
    assert_eq!(audits, 1);

    Ok(())
}

#[tokio::test]
async fn backfilled_product_without_price_costs_zero() -> anyhow::Result<()> {
    let Some(mut state) = common::db_state().await? else {
        return Ok(());
    };
    let mut config = (*state.config).clone();
    config.strict_totals = false;
    state.config = Arc::new(config);

    let user_id = common::create_user(&state.pool).await?;
    let gift = common::fresh_product_id("gift");

    submit_order(&state, order(user_id, 10, vec![line(&gift, 1, None)])).await?;

    let product = Products::find_by_id(gift).one(&state.orm).await?.expect("product");
    assert_eq!(product.price, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn existing_product_keeps_catalog_price() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user_id = common::create_user(&state.pool).await?;
    let mug = common::fresh_product_id("mug");
    sqlx::query("INSERT INTO products (id, name, price) VALUES ($1, 'Mug', 10)")
        .bind(&mug)
        .execute(&state.pool)
        .await?;

    let order_id = submit_order(&state, order(user_id, 30, vec![line(&mug, 3, None)])).await?;

    let placed = get_order_for_user(&state, user_id, order_id).await?;
    assert_eq!(placed.products[0].price, Decimal::from(10));
    let product = Products::find_by_id(mug).one(&state.orm).await?.expect("product");
    assert_eq!(product.name, "Mug");
    Ok(())
}

#[tokio::test]
async fn failing_line_item_rolls_back_everything() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user_id = common::create_user(&state.pool).await?;
    let first = common::fresh_product_id("first");
    let broken = common::fresh_product_id("broken");

    // NUMERIC(12, 2) cannot hold this price, so the second backfill fails.
    let result = submit_order(
        &state,
        order(
            user_id,
            10,
            vec![line(&first, 1, Some(10)), line(&broken, 1, Some(100_000_000_000))],
        ),
    )
    .await;

    let err = result.expect_err("insert must fail");
    assert!(err.is_persistence(), "unexpected error {err:?}");
    assert_eq!(order_count(&state, user_id).await?, 0);
    assert_eq!(item_count(&state, user_id).await?, 0);
    assert!(Products::find_by_id(first).one(&state.orm).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn mismatched_total_is_rejected_without_rows() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user_id = common::create_user(&state.pool).await?;
    let hat = common::fresh_product_id("hat");

    let result = submit_order(&state, order(user_id, 99, vec![line(&hat, 2, Some(75))])).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(order_count(&state, user_id).await?, 0);
    assert!(Products::find_by_id(hat).one(&state.orm).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn overflowing_line_total_is_rejected_without_rows() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user_id = common::create_user(&state.pool).await?;
    let bar = common::fresh_product_id("bar");
    sqlx::query("INSERT INTO products (id, name, price) VALUES ($1, 'Bar', 1)")
        .bind(&bar)
        .execute(&state.pool)
        .await?;

    let mut item = line(&bar, 2, None);
    item.price = Some(Decimal::MAX);
    let result = submit_order(&state, order(user_id, 10, vec![item])).await;

    match result {
        Err(AppError::Validation(message)) => assert!(message.contains("overflows")),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(order_count(&state, user_id).await?, 0);
    assert_eq!(item_count(&state, user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn timed_out_transaction_leaves_no_rows() -> anyhow::Result<()> {
    let Some(mut state) = common::db_state().await? else {
        return Ok(());
    };
    let mut config = (*state.config).clone();
    config.order_timeout = Duration::ZERO;
    state.config = Arc::new(config);

    let user_id = common::create_user(&state.pool).await?;
    let cap = common::fresh_product_id("cap");

    let result = submit_order(&state, order(user_id, 20, vec![line(&cap, 1, Some(20))])).await;

    assert!(matches!(result, Err(AppError::Timeout)));
    assert_eq!(order_count(&state, user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_backfill_creates_one_product() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let alice = common::create_user(&state.pool).await?;
    let bob = common::create_user(&state.pool).await?;
    let lamp = common::fresh_product_id("lamp");

    let (a, b) = tokio::join!(
        submit_order(&state, order(alice, 40, vec![line(&lamp, 1, Some(40))])),
        submit_order(&state, order(bob, 80, vec![line(&lamp, 2, Some(40))])),
    );
    a?;
    b?;

    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE id = $1")
        .bind(&lamp)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(products, 1);
    assert_eq!(item_count(&state, alice).await?, 1);
    assert_eq!(item_count(&state, bob).await?, 1);
    Ok(())
}

#[tokio::test]
async fn history_is_newest_first_and_scoped_to_user() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user_id = common::create_user(&state.pool).await?;
    let stranger = common::create_user(&state.pool).await?;

    assert!(list_orders_for_user(&state, user_id).await?.is_empty());

    let a = common::fresh_product_id("a");
    let b = common::fresh_product_id("b");
    let first = submit_order(&state, order(user_id, 5, vec![line(&a, 1, Some(5))])).await?;
    let second = submit_order(
        &state,
        order(user_id, 25, vec![line(&b, 2, Some(10)), line(&a, 1, Some(5))]),
    )
    .await?;

    let history = list_orders_for_user(&state, user_id).await?;
    let ids: Vec<_> = history.iter().map(|o| o.order_id).collect();
    assert_eq!(ids, [second, first]);
    assert!(history[0].created_at >= history[1].created_at);

    let lines: Vec<_> = history[0].products.iter().map(|p| p.product_id.clone()).collect();
    assert_eq!(lines, [b, a]);
    assert_eq!(history[1].products.len(), 1);

    assert!(matches!(
        get_order_for_user(&state, stranger, first).await,
        Err(AppError::NotFound)
    ));
    assert!(list_orders_for_user(&state, stranger).await?.is_empty());
    Ok(())
}
