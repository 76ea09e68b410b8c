//! Manual transaction control on a pooled connection.
//!
//! The store hands a transaction to the caller as a value that outlives any
//! single closure, so begin/commit/rollback are issued explicitly through
//! diesel-async's `AnsiTransactionManager` instead of `AsyncConnection::transaction`.

use diesel_async::{AnsiTransactionManager, AsyncPgConnection, TransactionManager};

use crate::db::connection::DbConnection;
use crate::error::DbResult;

fn raw<'c>(conn: &'c mut DbConnection<'_>) -> &'c mut AsyncPgConnection {
    &mut **conn
}

/// ## Summary
/// Opens a transaction on `conn`.
///
/// ## Errors
/// Returns a database error if `BEGIN` fails.
#[tracing::instrument(level = "trace", skip(conn))]
pub async fn begin(conn: &mut DbConnection<'_>) -> DbResult<()> {
    AnsiTransactionManager::begin_transaction(raw(conn)).await?;
    Ok(())
}

/// ## Summary
/// Commits the transaction open on `conn`.
///
/// ## Errors
/// Returns a database error if `COMMIT` fails.
#[tracing::instrument(level = "trace", skip(conn))]
pub async fn commit(conn: &mut DbConnection<'_>) -> DbResult<()> {
    AnsiTransactionManager::commit_transaction(raw(conn)).await?;
    Ok(())
}

/// ## Summary
/// Rolls back the transaction open on `conn`.
///
/// ## Errors
/// Returns a database error if `ROLLBACK` fails.
#[tracing::instrument(level = "trace", skip(conn))]
pub async fn rollback(conn: &mut DbConnection<'_>) -> DbResult<()> {
    AnsiTransactionManager::rollback_transaction(raw(conn)).await?;
    Ok(())
}
