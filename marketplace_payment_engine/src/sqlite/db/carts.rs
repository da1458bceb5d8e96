use sqlx::SqliteConnection;

pub async fn clear_cart(customer_id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1").bind(customer_id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn cart_item_count(customer_id: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
