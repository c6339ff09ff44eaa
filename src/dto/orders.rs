use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{OrderId, UserId},
};

/// Body of `POST /api/orders`.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitOrderRequest {
    pub order: Option<OrderPayload>,
}

/// Order as sent by the client. Every field is optional on the wire so that
/// missing fields surface as validation errors rather than decode failures.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderPayload {
    pub user_id: Option<UserId>,
    pub total: Option<Decimal>,
    pub address: Option<String>,
    pub products: Option<Vec<LineItemPayload>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineItemPayload {
    pub product_id: Option<String>,
    pub quantity: Option<i32>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderCreated {
    pub order_id: OrderId,
}

/// A validated order, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Decimal,
    pub address: String,
    pub line_items: Vec<NewLineItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub product_id: String,
    pub quantity: i32,
    pub name: String,
    pub price: Option<Decimal>,
}

impl TryFrom<SubmitOrderRequest> for NewOrder {
    type Error = AppError;

    fn try_from(request: SubmitOrderRequest) -> Result<Self, Self::Error> {
        let payload = request.order.ok_or_else(|| missing("order"))?;
        NewOrder::try_from(payload)
    }
}

impl TryFrom<OrderPayload> for NewOrder {
    type Error = AppError;

    fn try_from(payload: OrderPayload) -> Result<Self, Self::Error> {
        let user_id = payload.user_id.ok_or_else(|| missing("user_id"))?;
        if user_id <= 0 {
            return Err(invalid("user_id must be positive"));
        }

        let total = payload.total.ok_or_else(|| missing("total"))?;
        if total <= Decimal::ZERO {
            return Err(invalid("total must be greater than 0"));
        }
        check_amount("total", total)?;

        let address = non_blank(payload.address).ok_or_else(|| missing("address"))?;

        let products = payload.products.ok_or_else(|| missing("products"))?;
        if products.is_empty() {
            return Err(invalid("products must not be empty"));
        }

        let mut seen = HashSet::with_capacity(products.len());
        let mut line_items = Vec::with_capacity(products.len());
        for (index, item) in products.into_iter().enumerate() {
            let line = NewLineItem::parse(index, item)?;
            if !seen.insert(line.product_id.clone()) {
                return Err(invalid(format!(
                    "product {} appears more than once",
                    line.product_id
                )));
            }
            line_items.push(line);
        }

        Ok(NewOrder {
            user_id,
            total,
            address,
            line_items,
        })
    }
}

impl NewLineItem {
    fn parse(index: usize, item: LineItemPayload) -> Result<Self, AppError> {
        let product_id = non_blank(item.product_id)
            .ok_or_else(|| missing(&format!("products[{index}].product_id")))?;
        let quantity = item
            .quantity
            .ok_or_else(|| missing(&format!("products[{index}].quantity")))?;
        if quantity < 1 {
            return Err(invalid(format!(
                "products[{index}].quantity must be at least 1"
            )));
        }
        let name =
            non_blank(item.name).ok_or_else(|| missing(&format!("products[{index}].name")))?;
        if let Some(price) = item.price {
            if price < Decimal::ZERO {
                return Err(invalid(format!(
                    "products[{index}].price must not be negative"
                )));
            }
            check_amount(&format!("products[{index}].price"), price)?;
        }

        Ok(NewLineItem {
            product_id,
            quantity,
            name,
            price: item.price,
        })
    }
}

/// Amounts are stored as `NUMERIC(12, 2)`: at most two decimal places and
/// ten integer digits.
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Exclusive upper bound of a storable amount.
pub fn amount_limit() -> Decimal {
    Decimal::from(10_000_000_000i64)
}

fn check_amount(field: &str, amount: Decimal) -> Result<(), AppError> {
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(invalid(format!(
            "{field} must have at most {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    if amount.abs() >= amount_limit() {
        return Err(invalid(format!("{field} is too large")));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("missing field: {field}"))
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}
