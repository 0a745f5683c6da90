//! Core abstractions for proxying a virtual drive through a remote session.
//!
//! This crate provides the fundamental building blocks:
//! - `RemoteObject` / `RemoteValue` - Structured values crossing the session
//! - `Pipeline` - Ordered command batch for one round trip
//! - `ProviderItem` / `ItemWriter` - Locally emitted provider output
//! - `RemoteSession` trait and `SessionError`

pub mod item;
pub mod object;
pub mod pipeline;
pub mod security;
pub mod traits;

pub use item::{ItemChannel, ItemWriter, ProviderItem};
pub use object::{RemoteObject, RemoteValue};
pub use pipeline::Pipeline;
pub use security::{AccessControlSections, SecurityDescriptor};
pub use traits::{RemoteSession, ResultStream, SessionError};
