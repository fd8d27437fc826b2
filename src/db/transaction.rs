/*!
 * Transaction helpers
 *
 * Every aggregate mutation (stock, purchase totals, cascading deletes) runs
 * through `with_transaction` so the aggregate write and its dependent rows
 * commit or roll back together.
 */

use crate::errors::ServiceError;
use metrics::{counter, histogram};
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait, QuerySelect, Select,
    TransactionError, TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};
use uuid::Uuid;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute `f` inside a database transaction.
///
/// Commits when `f` returns `Ok`, rolls back otherwise. Connection-level
/// failures surface as `ServiceError::DatabaseError`; errors produced by the
/// closure come back unchanged.
///
/// ```rust,ignore
/// let material = with_transaction(&db, "stock.adjust", |txn| {
///     Box::pin(async move {
///         let row = for_update(material::Entity::find_by_id(id), txn.get_database_backend())
///             .one(txn)
///             .await?;
///         // ... write aggregate + append movement ...
///         Ok(row)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(
    db: &DatabaseConnection,
    operation: &'static str,
    f: F,
) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    let transaction_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    debug!(transaction_id = %transaction_id, operation, "Starting database transaction");
    counter!("coapp_db.transaction.started", 1, "operation" => operation);

    let result = db
        .transaction::<_, T, ServiceError>(f)
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
            TransactionError::Transaction(e) => e,
        });

    let elapsed = start.elapsed();
    histogram!("coapp_db.transaction.duration", elapsed, "operation" => operation);

    match &result {
        Ok(_) => {
            counter!("coapp_db.transaction.committed", 1, "operation" => operation);
            debug!(transaction_id = %transaction_id, operation, "Transaction committed in {:?}", elapsed);
        }
        Err(e) => {
            counter!("coapp_db.transaction.rolled_back", 1, "operation" => operation);
            warn!(transaction_id = %transaction_id, operation, error = %e, "Transaction rolled back after {:?}", elapsed);
        }
    }

    result
}

/// Adds `FOR UPDATE` to `select` on backends with row locks. SQLite already
/// serializes writers for the whole database, and rejects the clause.
pub fn for_update<E: EntityTrait>(select: Select<E>, backend: DbBackend) -> Select<E> {
    match backend {
        DbBackend::Sqlite => select,
        _ => select.lock_exclusive(),
    }
}
