//! Binding of a drive to its remote session.

use std::sync::{Arc, PoisonError, RwLock};

use remote_drive_core::{
    AccessControlSections, Pipeline, RemoteSession, RemoteValue, ResultStream, SecurityDescriptor,
    SessionError,
};

use crate::TransientVariable;

/// The current session every dispatch call executes against.
///
/// There is no retry or reconnect: a torn session surfaces as an error on
/// the next call that executes.
pub struct SessionBinding {
    session: RwLock<Arc<dyn RemoteSession>>,
}

impl SessionBinding {
    /// Bind to `session`.
    #[must_use]
    pub fn new(session: Arc<dyn RemoteSession>) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }

    /// The currently bound session.
    #[must_use]
    pub fn current(&self) -> Arc<dyn RemoteSession> {
        Arc::clone(&self.session.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the bound session. Calls already in flight keep the old one.
    pub fn rebind(&self, session: Arc<dyn RemoteSession>) {
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(from = current.name(), to = session.name(), "Rebinding session");
        *current = session;
    }

    /// Execute a pipeline against the current session.
    ///
    /// # Errors
    /// Returns error if the remote side fails to execute any command.
    pub async fn invoke(&self, pipeline: Pipeline) -> Result<ResultStream, SessionError> {
        let session = self.current();
        for command in pipeline.commands() {
            tracing::trace!(session = session.name(), %command, "Issuing command");
        }
        session.invoke(pipeline).await
    }

    /// Bind `value` to a fresh transient variable in the current session.
    ///
    /// # Errors
    /// Returns error if the session refuses the binding.
    pub async fn bind_variable(&self, value: RemoteValue) -> Result<TransientVariable, SessionError> {
        TransientVariable::bind(self.current(), value).await
    }

    /// Build a descriptor for `path` through the current session.
    ///
    /// # Errors
    /// Returns error if the remote side cannot build one.
    pub async fn new_security_descriptor_from_path(
        &self,
        path: &str,
        sections: AccessControlSections,
    ) -> Result<SecurityDescriptor, SessionError> {
        self.current()
            .new_security_descriptor_from_path(path, sections)
            .await
    }
}

impl std::fmt::Debug for SessionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBinding")
            .field("session", &self.current().name())
            .finish()
    }
}
