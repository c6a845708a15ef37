//! Configuration and persistence for `FluxConn`

mod settings;
mod store;

pub use settings::AppSettings;
pub use store::ConnectionStore;
