//! Data models for `FluxConn`

mod connection;

use std::collections::BTreeMap;

use uuid::Uuid;

pub use connection::{ConnectionRecord, RecordVersion};

/// The full connection registry: a keyed map from record id to record.
///
/// A `BTreeMap` keeps iteration order deterministic for a given set of keys,
/// which makes the self-healing tie-break in
/// [`crate::registry::ConnectionRegistry::list`] reproducible.
pub type Registry = BTreeMap<Uuid, ConnectionRecord>;
