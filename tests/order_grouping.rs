use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use storefront_api::{
    models::OrderStatus,
    services::order_service::{OrderRow, group_order_rows},
};

fn row(order_id: i64, day: u32, product: Option<(&str, i32)>) -> OrderRow {
    OrderRow {
        order_id,
        total: Decimal::from(100),
        address: "Cotonou".into(),
        status: "pending".into(),
        created_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
        product_id: product.map(|(id, _)| id.to_string()),
        product_name: product.map(|(id, _)| format!("name-{id}")),
        quantity: product.map(|(_, q)| q),
        price: product.map(|_| Decimal::from(10)),
    }
}

#[test]
fn groups_rows_per_order_preserving_first_appearance() {
    let rows = vec![
        row(9, 3, Some(("b", 1))),
        row(9, 3, Some(("a", 2))),
        row(4, 1, Some(("c", 3))),
    ];

    let orders = group_order_rows(rows);

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order_id, 9);
    assert_eq!(orders[1].order_id, 4);

    let first: Vec<_> = orders[0].products.iter().map(|p| p.product_id.as_str()).collect();
    assert_eq!(first, ["b", "a"]);
    assert_eq!(orders[0].products[1].quantity, 2);
    assert_eq!(orders[0].products[1].product_name, "name-a");
    assert_eq!(orders[1].products.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Pending);
}

#[test]
fn no_rows_means_no_orders() {
    assert!(group_order_rows(Vec::new()).is_empty());
}

#[test]
fn order_without_items_has_empty_products() {
    let orders = group_order_rows(vec![row(1, 1, None)]);
    assert_eq!(orders.len(), 1);
    assert!(orders[0].products.is_empty());
}

#[test]
fn unknown_status_falls_back_to_pending() {
    let mut r = row(1, 1, Some(("a", 1)));
    r.status = "archived".into();
    let orders = group_order_rows(vec![r]);
    assert_eq!(orders[0].status, OrderStatus::Pending);
}

#[test]
fn status_round_trips_through_text() {
    for status in [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
    }
    assert!("unknown".parse::<OrderStatus>().is_err());
}
