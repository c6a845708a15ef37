//! Inbound message protocol from the detached edit surface
//!
//! The surface sends JSON messages with a bounded command vocabulary; wire
//! field names are fixed by the panel contract and preserved here.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Wire name of the save command
const CMD_SAVE: &str = "save";
/// Wire name of the test command
const CMD_TEST: &str = "testConn";

/// Command carried by an inbound edit-surface message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCommand {
    /// Persist the form contents as a connection record
    Save,
    /// Probe the form contents without persisting
    Test,
    /// Anything else; silently ignored
    Unknown,
}

impl MessageCommand {
    /// Returns the wire representation of the command
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Save => CMD_SAVE,
            Self::Test => CMD_TEST,
            Self::Unknown => "unknown",
        }
    }
}

impl Serialize for MessageCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            CMD_SAVE => Self::Save,
            CMD_TEST => Self::Test,
            _ => Self::Unknown,
        })
    }
}

/// A structured message received from the edit surface
///
/// `conn_id` is empty for a brand-new connection. `conn_version` greater than
/// zero marks the legacy record shape.
#[derive(Clone, Serialize, Deserialize)]
pub struct EditMessage {
    /// The requested operation
    pub command: MessageCommand,
    /// Target record id; empty means "new"
    #[serde(rename = "connID", default)]
    pub conn_id: String,
    /// Schema generation flag
    #[serde(rename = "connVersion", default)]
    pub conn_version: i64,
    /// Display name
    #[serde(rename = "connName", default)]
    pub conn_name: String,
    /// Endpoint address
    #[serde(rename = "connHost", default)]
    pub conn_host: String,
    /// Authentication token; never logged
    #[serde(rename = "connToken", default)]
    pub conn_token: String,
    /// Organization identifier
    #[serde(rename = "connOrg", default)]
    pub conn_org: String,
}

impl EditMessage {
    /// Parses a message from its JSON wire form
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid JSON for the message
    /// shape. An unknown `command` value is not an error; it maps to
    /// [`MessageCommand::Unknown`].
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Debug for EditMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditMessage")
            .field("command", &self.command)
            .field("conn_id", &self.conn_id)
            .field("conn_version", &self.conn_version)
            .field("conn_name", &self.conn_name)
            .field("conn_host", &self.conn_host)
            .field("conn_token", &"<redacted>")
            .field("conn_org", &self.conn_org)
            .finish()
    }
}
