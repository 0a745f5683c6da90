//! In-memory remote session.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockWriteGuard},
};

use async_trait::async_trait;
use futures::StreamExt;
use remote_drive_core::{
    AccessControlSections, Pipeline, RemoteObject, RemoteSession, RemoteValue, ResultStream,
    SecurityDescriptor, SessionError,
};

/// Something the session was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A pipeline was invoked with these commands.
    Invoke(Vec<String>),
    SetVariable { name: String, value: RemoteValue },
    RemoveVariable(String),
    NewSecurityDescriptor {
        path: String,
        sections: AccessControlSections,
    },
}

/// In-memory session with scripted responses.
///
/// Useful for development and tests. Each command is matched against the
/// scripted responses by prefix, first match wins, and the matching results
/// are concatenated in command order. Every call is recorded. Null-assignment
/// and `Remove-Variable` commands act on the in-memory variable namespace so
/// leaks are observable.
pub struct MemorySession {
    name: String,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    events: Vec<SessionEvent>,
    responses: Vec<(String, Vec<RemoteObject>)>,
    failures: Vec<(String, String)>,
    variables: HashMap<String, RemoteValue>,
    descriptors: HashMap<String, SecurityDescriptor>,
    disconnected: bool,
}

impl MemorySession {
    /// Create an empty session.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return `results` for every command starting with `prefix`.
    pub fn respond(&self, prefix: impl Into<String>, results: Vec<RemoteObject>) {
        self.write().responses.push((prefix.into(), results));
    }

    /// Fail any pipeline reaching a command starting with `prefix`.
    pub fn fail_on(&self, prefix: impl Into<String>, message: impl Into<String>) {
        self.write().failures.push((prefix.into(), message.into()));
    }

    /// Register the descriptor returned for `path`.
    pub fn set_descriptor(&self, path: impl Into<String>, descriptor: SecurityDescriptor) {
        self.write().descriptors.insert(path.into(), descriptor);
    }

    /// Tear the session down; every later call fails.
    pub fn disconnect(&self) {
        self.write().disconnected = true;
    }

    /// All recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }

    /// Every invoked command, flattened across pipelines.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Invoke(commands) => Some(commands),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Variables currently bound.
    #[must_use]
    pub fn variables(&self) -> HashMap<String, RemoteValue> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .variables
            .clone()
    }

    /// Forget recorded events, keeping the script.
    pub fn clear_events(&self) {
        self.write().events.clear();
    }
}

impl Inner {
    fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.disconnected {
            Err(SessionError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn execute(&mut self, command: &str) -> Result<Vec<RemoteObject>, SessionError> {
        if let Some((_, message)) = self.failures.iter().find(|(p, _)| command.starts_with(p.as_str())) {
            return Err(SessionError::Execution(message.clone()));
        }

        if let Some(name) = command.strip_prefix("Remove-Variable -Name ") {
            self.variables.remove(name.trim());
            return Ok(Vec::new());
        }
        if let Some(name) = command.strip_prefix('$').and_then(|c| c.strip_suffix(" = $null")) {
            if let Some(value) = self.variables.get_mut(name) {
                *value = RemoteValue::Null;
            }
            return Ok(Vec::new());
        }

        Ok(self
            .responses
            .iter()
            .find(|(p, _)| command.starts_with(p.as_str()))
            .map(|(_, results)| results.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RemoteSession for MemorySession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, pipeline: Pipeline) -> Result<ResultStream, SessionError> {
        let mut inner = self.write();
        inner.events.push(SessionEvent::Invoke(pipeline.commands().to_vec()));
        inner.ensure_connected()?;

        let mut results = Vec::new();
        for command in pipeline.commands() {
            results.extend(inner.execute(command)?);
        }

        Ok(futures::stream::iter(results.into_iter().map(Ok)).boxed())
    }

    async fn set_variable(&self, name: &str, value: RemoteValue) -> Result<(), SessionError> {
        let mut inner = self.write();
        inner.events.push(SessionEvent::SetVariable {
            name: name.to_owned(),
            value: value.clone(),
        });
        inner.ensure_connected()?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SessionError::VariableBinding {
                name: name.to_owned(),
                reason: "not a valid variable name".into(),
            });
        }
        inner.variables.insert(name.to_owned(), value);
        Ok(())
    }

    async fn remove_variable(&self, name: &str) -> Result<(), SessionError> {
        let mut inner = self.write();
        inner.events.push(SessionEvent::RemoveVariable(name.to_owned()));
        inner.ensure_connected()?;
        inner.variables.remove(name);
        Ok(())
    }

    async fn new_security_descriptor_from_path(
        &self,
        path: &str,
        sections: AccessControlSections,
    ) -> Result<SecurityDescriptor, SessionError> {
        let mut inner = self.write();
        inner.events.push(SessionEvent::NewSecurityDescriptor {
            path: path.to_owned(),
            sections,
        });
        inner.ensure_connected()?;
        inner
            .descriptors
            .get(path)
            .map(|sd| SecurityDescriptor::new(sd.sddl.clone(), sections))
            .ok_or_else(|| SessionError::Execution(format!("Cannot find path '{path}'")))
    }
}
