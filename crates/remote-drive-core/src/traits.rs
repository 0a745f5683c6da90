//! The remote execution boundary.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::{AccessControlSections, Pipeline, RemoteObject, RemoteValue, SecurityDescriptor};

/// One-shot, ordered stream of result objects from a single invocation.
///
/// Once consumed it cannot be restarted; the pipeline must be re-issued.
pub type ResultStream = BoxStream<'static, Result<RemoteObject, SessionError>>;

/// Session error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Remote execution failed: {0}")]
    Execution(String),
    #[error("Failed to bind variable {name}: {reason}")]
    VariableBinding { name: String, reason: String },
    #[error("Session is disconnected")]
    Disconnected,
}

/// An already-connected remote execution environment.
///
/// Implementations own transport, authentication and serialization of
/// calls; none of that is visible here.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Human-readable session name, used in logs.
    fn name(&self) -> &str;

    /// Execute every command of the pipeline in order.
    async fn invoke(&self, pipeline: Pipeline) -> Result<ResultStream, SessionError>;

    /// Bind a value to a name in the remote variable namespace.
    async fn set_variable(&self, name: &str, value: RemoteValue) -> Result<(), SessionError>;

    /// Remove a variable from the remote namespace. Removing an unknown
    /// name is not an error.
    async fn remove_variable(&self, name: &str) -> Result<(), SessionError>;

    /// Build a descriptor for `path` using the session's own provider.
    async fn new_security_descriptor_from_path(
        &self,
        path: &str,
        sections: AccessControlSections,
    ) -> Result<SecurityDescriptor, SessionError>;
}
