use thiserror::Error;

use crate::db::traits::StoreError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("A refund has already been requested for order {0}")]
    DuplicateRefund(String),
}

impl From<SqliteDatabaseError> for StoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DuplicateRefund(order_id) => StoreError::Duplicate(format!("refund for order {order_id}")),
            e => StoreError::DatabaseError(e.to_string()),
        }
    }
}
