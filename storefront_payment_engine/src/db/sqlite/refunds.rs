use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewRefundRequest, OrderId, RefundRequest},
};

pub async fn fetch_refund_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<RefundRequest>, SqliteDatabaseError> {
    let refund = sqlx::query_as::<_, RefundRequest>(
        "SELECT id, order_id, reason, created_at FROM refund_requests WHERE order_id = $1 LIMIT 1",
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(refund)
}

/// Stores a refund request. Each order may have at most one, which the `UNIQUE` constraint on `order_id` enforces.
pub async fn insert_refund_request(
    request: &NewRefundRequest,
    conn: &mut SqliteConnection,
) -> Result<RefundRequest, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, RefundRequest>(
        r#"
            INSERT INTO refund_requests (order_id, reason, created_at) VALUES ($1, $2, $3)
            RETURNING id, order_id, reason, created_at;
        "#,
    )
    .bind(request.order_id.as_str())
    .bind(request.reason.as_str())
    .bind(chrono::Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(refund) => {
            debug!("🗃️ Refund request #{} saved for order {}", refund.id, refund.order_id);
            Ok(refund)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(SqliteDatabaseError::DuplicateRefund(request.order_id.as_str().to_string()))
        },
        Err(e) => Err(e.into()),
    }
}
