//! Connection registry operations

mod manager;

pub use manager::ConnectionRegistry;
