//! Create/edit workflow for connection records
//!
//! The workflow runs against a detached UI surface that communicates only via
//! structured messages: the session opens the surface with a prefilled form,
//! then consumes inbound messages until a save resolves it.

mod message;
mod session;

pub use message::{EditMessage, MessageCommand};
pub use session::{EditForm, EditSession, EditSurface, MessageOutcome, SessionState};
