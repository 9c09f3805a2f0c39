//! The statement execution capability consumed by the record mapper.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::result::ResultSet;
use crate::value::Value;

/// Executes one statement with positional parameters.
///
/// Implementations own connection management, statement preparation and
/// any retry or timeout policy. Every call is a suspension point; callers
/// issue statements strictly one after another.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute `statement`, binding `params` to its `?` markers in order.
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, ExecutionError>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, ExecutionError> {
        (**self).execute(statement, params).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Box<E> {
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, ExecutionError> {
        (**self).execute(statement, params).await
    }
}
