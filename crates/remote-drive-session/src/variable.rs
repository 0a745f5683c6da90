//! Transient remote variables.
//!
//! Values that cannot be written into a command as a literal (descriptors,
//! name lists) are bound to a uniquely named remote variable, referenced by
//! name from the command text, then unbound again.

use std::sync::Arc;

use remote_drive_core::{Pipeline, RemoteSession, RemoteValue, SessionError, pipeline::variable_ref};
use tokio::runtime::Handle;
use uuid::Uuid;

/// Handle to a variable bound in the remote namespace.
///
/// The variable is released exactly once, on whichever path the owning
/// operation leaves by:
/// - success: the in-pipeline commands from [`append_unbind`](Self::append_unbind)
///   already removed it, and [`settle`](Self::settle) just disarms the guard;
/// - failure: [`settle`](Self::settle) removes it through the session;
/// - drop while still armed: removal is spawned on the current runtime.
pub struct TransientVariable {
    name: String,
    session: Arc<dyn RemoteSession>,
    armed: bool,
}

impl TransientVariable {
    /// Bind `value` under a fresh collision-resistant name.
    ///
    /// # Errors
    /// Returns error if the session refuses the binding.
    pub async fn bind(
        session: Arc<dyn RemoteSession>,
        value: RemoteValue,
    ) -> Result<Self, SessionError> {
        let name = Uuid::new_v4().simple().to_string();
        session.set_variable(&name, value).await?;
        tracing::trace!(session = session.name(), variable = %name, "Bound transient variable");
        Ok(Self {
            name,
            session,
            armed: true,
        })
    }

    /// Variable name, without sigil.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference to the variable for use inside command text.
    #[must_use]
    pub fn reference(&self) -> String {
        variable_ref(&self.name)
    }

    /// Append the null-assignment and removal commands to `pipeline`.
    pub fn append_unbind(&self, pipeline: &mut Pipeline) {
        pipeline
            .add_script(format!("{} = $null", self.reference()))
            .add_script(format!("Remove-Variable -Name {}", self.name));
    }

    /// Finish the scope with the outcome of the operation that used it.
    ///
    /// On failure the variable is removed explicitly before the original
    /// error is returned; a failing removal is only logged. Removal alone
    /// suffices here, so no `$null` assignment is issued first.
    ///
    /// # Errors
    /// Returns `outcome` unchanged.
    pub async fn settle<T, E>(mut self, outcome: Result<T, E>) -> Result<T, E> {
        if outcome.is_ok() {
            self.armed = false;
            return outcome;
        }
        if let Err(e) = self.release_now().await {
            tracing::warn!(variable = %self.name, "Failed to remove transient variable: {e}");
        }
        outcome
    }

    /// Remove the variable through the session immediately.
    ///
    /// # Errors
    /// Returns error if the session fails to remove it.
    pub async fn release(mut self) -> Result<(), SessionError> {
        self.release_now().await
    }

    async fn release_now(&mut self) -> Result<(), SessionError> {
        self.armed = false;
        self.session.remove_variable(&self.name).await
    }
}

impl std::fmt::Debug for TransientVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransientVariable")
            .field("name", &self.name)
            .field("session", &self.session.name())
            .field("armed", &self.armed)
            .finish()
    }
}

impl Drop for TransientVariable {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let name = std::mem::take(&mut self.name);
        let session = Arc::clone(&self.session);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.remove_variable(&name).await {
                        tracing::warn!(variable = %name, "Failed to remove transient variable: {e}");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(variable = %name, "No runtime to remove transient variable, leaking it");
            }
        }
    }
}
