use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    dto::orders::{LineItemPayload, OrderPayload, SubmitOrderRequest},
    models::UserId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// Shopping cart kept by the client until checkout.
///
/// Lines stay in insertion order, product ids are unique and quantities are
/// always positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product, creating the line if needed.
    pub fn add_item(&mut self, product_id: impl Into<String>, name: impl Into<String>, price: Decimal) {
        let product_id = product_id.into();
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem {
                product_id,
                name: name.into(),
                price,
                quantity: 1,
            }),
        }
    }

    pub fn remove_item(&mut self, product_id: &str) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Set the quantity of an existing line. Zero or less removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i32) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the line totals, saturating at `Decimal::MAX`.
    pub fn total(&self) -> Decimal {
        self.items.iter().fold(Decimal::ZERO, |total, i| {
            total.saturating_add(i.price.saturating_mul(Decimal::from(i.quantity)))
        })
    }

    /// Snapshot the cart as the body of `POST /api/orders`.
    pub fn to_order_request(&self, user_id: UserId, address: &str) -> SubmitOrderRequest {
        let products = self
            .items
            .iter()
            .map(|i| LineItemPayload {
                product_id: Some(i.product_id.clone()),
                quantity: Some(i.quantity),
                name: Some(i.name.clone()),
                price: Some(i.price),
            })
            .collect();

        SubmitOrderRequest {
            order: Some(OrderPayload {
                user_id: Some(user_id),
                total: Some(self.total()),
                address: Some(address.to_string()),
                products: Some(products),
            }),
        }
    }
}
