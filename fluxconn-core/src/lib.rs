//! `FluxConn` Core Library
//!
//! This crate provides the connection-management core of an IDE extension
//! for a time-series database query engine: a persisted registry of named
//! data-source connections with a single-active-connection invariant, a
//! tree-view projection kept in sync through change notifications, and a
//! message-driven create/edit workflow over a detached UI surface.

pub mod active;
pub mod config;
pub mod edit;
pub mod error;
pub mod models;
pub mod registry;
pub mod tester;
pub mod tree;

pub use active::ActiveConnection;
pub use config::{AppSettings, ConnectionStore};
pub use edit::{
    EditForm, EditMessage, EditSession, EditSurface, MessageCommand, MessageOutcome, SessionState,
};
pub use error::{
    FluxConnError, RegistryError, RegistryResult, StoreError, StoreResult, TestError, TestResult,
};
pub use models::{ConnectionRecord, RecordVersion, Registry};
pub use registry::ConnectionRegistry;
pub use tester::ConnectionTester;
pub use tree::{ChildLister, ChildNode, ConnectionNode, TreeEvent, TreeNotifier, TreeSync};
