//! Edit session state machine
//!
//! A session drives one create-or-edit workflow: it opens the detached
//! surface with a prefilled form, consumes inbound messages, and resolves
//! only through a successful save. Test requests leave the session open.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{RegistryResult, TestError};
use crate::models::{ConnectionRecord, RecordVersion};
use crate::registry::ConnectionRegistry;
use crate::tester::ConnectionTester;

use super::message::{EditMessage, MessageCommand};

/// Lifecycle state of an edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No surface open yet
    #[default]
    Idle,
    /// Surface open, waiting for a save or test message
    AwaitingUserInput,
    /// A save resolved the session; it is discarded after
    Resolved,
}

/// Form contents used to prefill the edit surface
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditForm {
    /// Target record id; empty for a new connection
    pub conn_id: String,
    /// Schema generation of the record being edited
    pub version: RecordVersion,
    /// Display name
    pub name: String,
    /// Endpoint address
    pub host_and_port: String,
    /// Authentication token
    pub token: String,
    /// Organization identifier
    pub org: String,
}

impl EditForm {
    /// Empty defaults for a new connection, optionally seeded with the
    /// configured default endpoint
    #[must_use]
    pub fn empty(seed_endpoint: Option<&str>) -> Self {
        Self {
            version: RecordVersion::V2,
            host_and_port: seed_endpoint.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    /// Prefill from an existing record (edit case)
    #[must_use]
    pub fn from_record(record: &ConnectionRecord) -> Self {
        Self {
            conn_id: record.id.to_string(),
            version: record.version,
            name: record.name.clone(),
            host_and_port: record.host_and_port.clone(),
            token: record.token.clone(),
            org: record.org.clone(),
        }
    }
}

/// The detached UI surface the session talks to
///
/// The surface is an isolated panel; the core shares no memory with it and
/// only hands it a form to render. Inbound traffic arrives separately as
/// [`EditMessage`] values.
pub trait EditSurface: Send {
    /// Opens (or re-renders) the surface with the given form contents
    fn open(&mut self, form: &EditForm);

    /// Closes the surface
    fn close(&mut self);
}

/// Result of handling one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The record was persisted and activated; the session is resolved
    Saved(ConnectionRecord),
    /// The tester reached the endpoint
    TestPassed,
    /// The tester failed; the message is surfaced verbatim to the user
    TestFailed(String),
    /// The message carried no recognized command, or the session was not
    /// accepting input
    Ignored,
}

/// One create-or-edit workflow over a detached surface
#[derive(Debug)]
pub struct EditSession<S: EditSurface> {
    state: SessionState,
    surface: S,
}

impl<S: EditSurface> EditSession<S> {
    /// Starts a session for a brand-new connection
    ///
    /// The configured default endpoint seeds the host field only when the
    /// registry has no entries yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read to decide seeding.
    pub fn begin_new(
        mut surface: S,
        registry: &ConnectionRegistry,
        default_endpoint: Option<&str>,
    ) -> RegistryResult<Self> {
        let seed = if registry.is_empty()? {
            default_endpoint
        } else {
            None
        };
        let form = EditForm::empty(seed);
        surface.open(&form);
        Ok(Self {
            state: SessionState::AwaitingUserInput,
            surface,
        })
    }

    /// Starts a session editing an existing record
    #[must_use]
    pub fn begin_edit(mut surface: S, record: &ConnectionRecord) -> Self {
        let form = EditForm::from_record(record);
        surface.open(&form);
        Self {
            state: SessionState::AwaitingUserInput,
            surface,
        }
    }

    /// Returns the session's current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Closes the surface without resolving the session
    ///
    /// A message already in flight is still handled if delivered; a save in
    /// particular still mutates the registry.
    pub fn dismiss(&mut self) {
        self.surface.close();
    }

    /// Handles one inbound message from the surface
    ///
    /// `Save` persists and activates the record, closes the surface, and
    /// resolves the session. `Test` probes a transient, never-persisted
    /// record and leaves the session open. Anything else is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a save cannot be persisted. Tester failures are
    /// not errors; they surface as [`MessageOutcome::TestFailed`].
    pub async fn handle_message(
        &mut self,
        registry: &mut ConnectionRegistry,
        tester: &dyn ConnectionTester,
        message: EditMessage,
    ) -> RegistryResult<MessageOutcome> {
        if self.state != SessionState::AwaitingUserInput {
            debug!(state = ?self.state, "message outside input state ignored");
            return Ok(MessageOutcome::Ignored);
        }

        match message.command {
            MessageCommand::Save => {
                let (record, is_new) = record_from_message(&message);
                let saved = registry.upsert(record, is_new)?;
                self.surface.close();
                self.state = SessionState::Resolved;
                Ok(MessageOutcome::Saved(saved))
            }
            MessageCommand::Test => {
                // Transient record under a synthetic id; never persisted
                let (mut record, _) = record_from_message(&message);
                record.id = Uuid::new_v4();
                match tester.test(&record).await {
                    Ok(()) => Ok(MessageOutcome::TestPassed),
                    Err(TestError::Failed(reason)) => Ok(MessageOutcome::TestFailed(reason)),
                }
            }
            MessageCommand::Unknown => {
                debug!("unrecognized edit-surface command ignored");
                Ok(MessageOutcome::Ignored)
            }
        }
    }
}

/// Converts message fields into a record plus the is-new marker
fn record_from_message(message: &EditMessage) -> (ConnectionRecord, bool) {
    let mut record = ConnectionRecord::new(
        message.conn_name.clone(),
        message.conn_host.clone(),
        message.conn_token.clone(),
        message.conn_org.clone(),
    )
    .with_version(RecordVersion::from_wire(message.conn_version));

    if message.conn_id.is_empty() {
        return (record, true);
    }
    match Uuid::parse_str(&message.conn_id) {
        Ok(id) => {
            record.id = id;
            (record, false)
        }
        Err(_) => {
            warn!(conn_id = %message.conn_id, "unparseable message id, treating as new");
            (record, true)
        }
    }
}
