//! Session binding and transient variable management for remote drives.
//!
//! Provides:
//! - `SessionBinding` - The current session all dispatch calls go through
//! - `TransientVariable` - Scoped remote variable with guaranteed release
//! - `MemorySession` - In-memory scripted session (feature: memory)

pub mod binding;
pub mod variable;

#[cfg(feature = "memory")]
pub mod memory;

pub use binding::SessionBinding;
pub use variable::TransientVariable;

#[cfg(feature = "memory")]
pub use memory::{MemorySession, SessionEvent};
