//! Display node types for the connection tree

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TestResult;
use crate::models::ConnectionRecord;

/// Query issued against a connection to list its child entries
const CHILD_QUERY: &str = "buckets()";

/// Progress label shown while fetching child entries
const CHILD_FETCH_LABEL: &str = "Fetching buckets";

/// A child entry beneath a connection node (a bucket)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNode {
    /// Display label for the entry
    pub label: String,
}

impl ChildNode {
    /// Creates a child node with the given label
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Abstraction over the downstream client that lists a connection's children
#[async_trait]
pub trait ChildLister: Send + Sync {
    /// Runs `query` against the connection and maps the result to child nodes
    ///
    /// # Errors
    ///
    /// Returns `TestError::Failed` with a user-facing message when the query
    /// cannot be executed.
    async fn list(
        &self,
        record: &ConnectionRecord,
        query: &str,
        label: &str,
    ) -> TestResult<Vec<ChildNode>>;
}

/// A top-level tree node representing one connection record
///
/// Carries a snapshot of the record taken at derivation time; the node never
/// writes back to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionNode {
    record: ConnectionRecord,
}

impl ConnectionNode {
    /// Wraps a record snapshot in a display node
    #[must_use]
    pub const fn new(record: ConnectionRecord) -> Self {
        Self { record }
    }

    /// Returns the id of the underlying record
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.record.id
    }

    /// Returns the display label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.record.name
    }

    /// Returns `true` if this node represents the selected connection
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.record.is_active
    }

    /// Returns the record snapshot this node was derived from
    #[must_use]
    pub const fn record(&self) -> &ConnectionRecord {
        &self.record
    }

    /// Lazily fetches this node's children (buckets) from the downstream client
    ///
    /// # Errors
    ///
    /// Propagates the lister's failure message verbatim.
    pub async fn children(&self, lister: &dyn ChildLister) -> TestResult<Vec<ChildNode>> {
        lister
            .list(&self.record, CHILD_QUERY, CHILD_FETCH_LABEL)
            .await
    }
}
