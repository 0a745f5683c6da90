//! Command pipeline building utilities.

use serde::{Deserialize, Serialize};

/// Ordered batch of command strings executed in one round trip.
///
/// A pipeline is built fresh for every provider call and consumed by
/// [`RemoteSession::invoke`](crate::RemoteSession::invoke). Commands run in
/// insertion order and their results are concatenated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    commands: Vec<String>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Append a command, builder style.
    #[must_use]
    pub fn script<S: Into<String>>(mut self, command: S) -> Self {
        self.add_script(command);
        self
    }

    /// Append a command.
    pub fn add_script<S: Into<String>>(&mut self, command: S) -> &mut Self {
        self.commands.push(command.into());
        self
    }

    /// Append several commands.
    pub fn extend<I>(&mut self, commands: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
        self
    }

    /// Commands in execution order.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

/// Render a string as a single-quoted literal.
///
/// Embedded single quotes are doubled, which is the only escape a
/// single-quoted literal recognises.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Render a boolean as `$true` / `$false`.
#[must_use]
pub const fn bool_literal(value: bool) -> &'static str {
    if value { "$true" } else { "$false" }
}

/// Render a reference to a named variable.
#[must_use]
pub fn variable_ref(name: &str) -> String {
    format!("${name}")
}

/// Render a comma-separated list of quoted literals.
#[must_use]
pub fn literal_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| quote_literal(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}
