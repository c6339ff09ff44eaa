use crate::{
    error::{AppError, AppResult},
    models::Product,
    state::AppState,
};

pub async fn list_products(state: &AppState) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, created_at FROM products ORDER BY name ASC, id ASC",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(products)
}

pub async fn get_product(state: &AppState, id: &str) -> AppResult<Product> {
    sqlx::query_as::<_, Product>("SELECT id, name, price, created_at FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)
}
