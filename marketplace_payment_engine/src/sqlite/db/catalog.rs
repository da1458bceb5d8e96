use sqlx::SqliteConnection;

use crate::db_types::ProductKind;

/// Find which catalog shape owns `product_ref`, probing [`ProductKind::FALLBACK_ORDER`] and stopping at the first
/// hit.
pub async fn resolve_catalog_entry(
    product_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ProductKind>, sqlx::Error> {
    for kind in ProductKind::FALLBACK_ORDER {
        let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM catalog_entries WHERE product_ref = $1 AND kind = $2")
            .bind(product_ref)
            .bind(kind)
            .fetch_optional(&mut *conn)
            .await?;
        if found.is_some() {
            return Ok(Some(kind));
        }
    }
    Ok(None)
}

/// Decrement `main_stock` for one stock sub-record. Returns `false` when no matching sub-record exists.
pub async fn decrement_stock(
    product_ref: &str,
    kind: ProductKind,
    variant_id: &str,
    location_id: &str,
    qty: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE stock_levels
            SET main_stock = main_stock - $5
            WHERE product_ref = $1 AND kind = $2 AND variant_id = $3 AND location_id = $4;
        "#,
    )
    .bind(product_ref)
    .bind(kind)
    .bind(variant_id)
    .bind(location_id)
    .bind(qty)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_stock_level(
    product_ref: &str,
    kind: ProductKind,
    variant_id: &str,
    location_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let stock: Option<(i64,)> = sqlx::query_as(
        "SELECT main_stock FROM stock_levels WHERE product_ref = $1 AND kind = $2 AND variant_id = $3 AND location_id \
         = $4",
    )
    .bind(product_ref)
    .bind(kind)
    .bind(variant_id)
    .bind(location_id)
    .fetch_optional(conn)
    .await?;
    Ok(stock.map(|(s,)| s))
}
