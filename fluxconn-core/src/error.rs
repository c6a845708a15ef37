//! Error types for `FluxConn`
//!
//! This module defines all error types used throughout the `FluxConn` core,
//! providing descriptive error messages for persistence, registry, and
//! connection-test operations.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for `FluxConn` operations
#[derive(Debug, Error)]
pub enum FluxConnError {
    /// Persistence-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Registry-related errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Connection test errors
    #[error("Test error: {0}")]
    Test(#[from] TestError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the persisted connection store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configuration directory could not be determined
    #[error("Configuration directory not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read a store file
    #[error("Failed to read store: {0}")]
    Read(String),

    /// Failed to parse a store file
    #[error("Failed to deserialize store: {0}")]
    Deserialize(String),

    /// Failed to serialize store contents
    #[error("Failed to serialize store: {0}")]
    Serialize(String),

    /// Failed to write a store file
    #[error("Failed to write store: {0}")]
    Write(String),
}

/// Errors related to registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Operation referenced a connection id absent from the registry
    #[error("Connection with ID {0} not found")]
    NotFound(Uuid),

    /// Persistence failed while applying a registry operation
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors returned by the external connection tester
#[derive(Debug, Error)]
pub enum TestError {
    /// The tester reported a failure; the message is surfaced verbatim
    #[error("{0}")]
    Failed(String),
}

/// Result type alias for `FluxConn` operations
pub type Result<T> = std::result::Result<T, FluxConnError>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Result type alias for connection test operations
pub type TestResult<T> = std::result::Result<T, TestError>;
