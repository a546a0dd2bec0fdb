use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{OrderId, PaymentStatus, StatusUpdate},
};

const PAYMENT_STATUS_COLUMNS: &str =
    "order_id, status, payment_provider, payment_reference, status_updated_at, created_at";

/// Inserts or updates the payment status for an order in one statement.
///
/// `COALESCE` keeps the stored provider and reference when the update leaves them out. This is not wrapped in a
/// transaction. Embed the call in one and pass `&mut *tx` as the connection if you need to combine it with other
/// writes.
pub async fn upsert_status(
    update: &StatusUpdate,
    conn: &mut SqliteConnection,
) -> Result<PaymentStatus, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, PaymentStatus>(&format!(
        r#"
            INSERT INTO payment_status (
                order_id,
                status,
                payment_provider,
                payment_reference,
                status_updated_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (order_id) DO UPDATE SET
                status = excluded.status,
                payment_provider = COALESCE(excluded.payment_provider, payment_status.payment_provider),
                payment_reference = COALESCE(excluded.payment_reference, payment_status.payment_reference),
                status_updated_at = excluded.status_updated_at
            RETURNING {PAYMENT_STATUS_COLUMNS};
        "#
    ))
    .bind(update.order_id.as_str())
    .bind(update.status.as_str())
    .bind(update.payment_provider.as_deref())
    .bind(update.payment_reference.as_deref())
    .bind(update.updated_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} payment status is now {}", record.order_id, record.status);
    trace!("🗃️ Stored payment status: {record:?}");
    Ok(record)
}

pub async fn fetch_status(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentStatus>, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, PaymentStatus>(&format!(
        "SELECT {PAYMENT_STATUS_COLUMNS} FROM payment_status WHERE order_id = $1"
    ))
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Returns the most recently updated order carrying `reference`. References are unique per provider transaction, so
/// more than one match only happens if a provider re-uses references across orders.
pub async fn fetch_status_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentStatus>, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, PaymentStatus>(&format!(
        r#"
            SELECT {PAYMENT_STATUS_COLUMNS} FROM payment_status
            WHERE payment_reference = $1
            ORDER BY status_updated_at DESC
            LIMIT 1
        "#
    ))
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}
