use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{new_pool, payment_status, refunds, SqliteDatabaseError};
use crate::{
    db::traits::{OrderStatusStore, RefundManagement, StoreError},
    db_types::{NewRefundRequest, OrderId, PaymentStatus, RefundRequest, StatusUpdate},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to `url`, creating the database file if it doesn't exist yet. Migrations are not run; call
    /// [`Self::migrate`] for that.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderStatusStore for SqliteDatabase {
    async fn write_status(&self, update: &StatusUpdate) -> Result<PaymentStatus, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let record = payment_status::upsert_status(update, &mut conn).await?;
        Ok(record)
    }

    async fn fetch_status(&self, order_id: &OrderId) -> Result<Option<PaymentStatus>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let record = payment_status::fetch_status(order_id, &mut conn).await?;
        Ok(record)
    }

    async fn fetch_status_by_reference(&self, reference: &str) -> Result<Option<PaymentStatus>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let record = payment_status::fetch_status_by_reference(reference, &mut conn).await?;
        Ok(record)
    }
}

impl RefundManagement for SqliteDatabase {
    async fn fetch_refund_for_order(&self, order_id: &OrderId) -> Result<Option<RefundRequest>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let refund = refunds::fetch_refund_for_order(order_id, &mut conn).await?;
        Ok(refund)
    }

    async fn insert_refund_request(&self, request: &NewRefundRequest) -> Result<RefundRequest, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let refund = refunds::insert_refund_request(request, &mut conn).await?;
        Ok(refund)
    }
}
