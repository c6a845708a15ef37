//! Connection tester trait definition
//!
//! The tester is an external collaborator: the edit workflow hands it a
//! transient, unsaved record and surfaces its verdict verbatim. The core
//! never retries and never mutates state on a test failure.

use async_trait::async_trait;

use crate::error::TestResult;
use crate::models::ConnectionRecord;

/// Abstraction over the query-engine client used to test a connection
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    /// Checks whether the given connection can reach its endpoint
    ///
    /// # Errors
    ///
    /// Returns `TestError::Failed` with a user-facing message when the
    /// connection cannot be established.
    async fn test(&self, record: &ConnectionRecord) -> TestResult<()>;
}
