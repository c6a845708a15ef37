//! Connection record model representing a saved data-source configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema generation of a connection record
///
/// Controls how the record's query language/dialect is interpreted downstream;
/// the registry itself never branches on it. Records persisted before the tag
/// existed deserialize as [`RecordVersion::V1`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordVersion {
    /// Legacy record shape
    #[default]
    V1,
    /// Current record shape
    V2,
}

impl RecordVersion {
    /// Maps the panel message's `connVersion` integer onto a version tag.
    ///
    /// Any value greater than zero marks the legacy shape.
    #[must_use]
    pub fn from_wire(conn_version: i64) -> Self {
        if conn_version > 0 {
            Self::V1
        } else {
            Self::V2
        }
    }
}

/// A saved data-source connection
///
/// Records are owned exclusively by the registry; UI layers receive clones.
/// The `id` is assigned once at creation and never regenerated by edit or
/// switch operations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Unique identifier for the connection
    pub id: Uuid,
    /// Schema generation tag
    #[serde(default)]
    pub version: RecordVersion,
    /// Human-readable name for the connection
    pub name: String,
    /// Endpoint address (host and port), opaque to the registry
    pub host_and_port: String,
    /// Authentication token; treated as a secret and never logged
    pub token: String,
    /// Organization/tenant identifier
    pub org: String,
    /// Whether this is the currently selected connection
    #[serde(default)]
    pub is_active: bool,
}

impl ConnectionRecord {
    /// Creates a new inactive record with a fresh id and the current schema
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        host_and_port: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: RecordVersion::V2,
            name: name.into(),
            host_and_port: host_and_port.into(),
            token: token.into(),
            org: org.into(),
            is_active: false,
        }
    }

    /// Sets the schema generation tag
    #[must_use]
    pub const fn with_version(mut self, version: RecordVersion) -> Self {
        self.version = version;
        self
    }
}

impl std::fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("name", &self.name)
            .field("host_and_port", &self.host_and_port)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("is_active", &self.is_active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_inactive_current_schema() {
        let record = ConnectionRecord::new("local", "localhost:8086", "t0ken", "myorg");
        assert!(!record.is_active);
        assert_eq!(record.version, RecordVersion::V2);
        assert_eq!(record.name, "local");
    }

    #[test]
    fn test_wire_version_mapping() {
        assert_eq!(RecordVersion::from_wire(1), RecordVersion::V1);
        assert_eq!(RecordVersion::from_wire(42), RecordVersion::V1);
        assert_eq!(RecordVersion::from_wire(0), RecordVersion::V2);
        assert_eq!(RecordVersion::from_wire(-1), RecordVersion::V2);
    }

    #[test]
    fn test_debug_redacts_token() {
        let record = ConnectionRecord::new("local", "localhost:8086", "sup3rs3cret", "myorg");
        let rendered = format!("{record:?}");
        assert!(!rendered.contains("sup3rs3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_version_persists_as_lowercase_string_tag() {
        let record = ConnectionRecord::new("local", "localhost:8086", "t", "o");
        let rendered = toml::to_string(&record).unwrap();
        assert!(rendered.contains("version = \"v2\""));

        let legacy = record.with_version(RecordVersion::V1);
        let rendered = toml::to_string(&legacy).unwrap();
        assert!(rendered.contains("version = \"v1\""));
    }

    #[test]
    fn test_missing_version_tag_deserializes_as_legacy() {
        let toml = r#"
            id = "6f1b4c42-9f9d-4a2e-b0a1-0e3a7a1d2c3b"
            name = "old"
            host_and_port = "localhost:8086"
            token = "t"
            org = "o"
        "#;
        let record: ConnectionRecord = toml::from_str(toml).unwrap();
        assert_eq!(record.version, RecordVersion::V1);
        assert!(!record.is_active);
    }
}
