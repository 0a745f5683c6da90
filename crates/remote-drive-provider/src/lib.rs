//! Virtual-drive provider that proxies filesystem verbs through a remote session.
//!
//! Provides:
//! - Capability traits, one method per filesystem verb
//! - `RemoteDriveProxy` - The dispatcher implementing them
//! - Drive binding and the drive table

pub mod commands;
pub mod dispatcher;
pub mod drive;
pub mod error;
pub mod provider;

pub use dispatcher::RemoteDriveProxy;
pub use drive::{DriveInfo, DriveParameters, DriveParametersBuilder, DriveTable, RemoteDrive};
pub use error::{ProviderError, ProviderResult};
pub use provider::{
    ContainerProvider, ItemProvider, NavigationProvider, PropertyProvider, ReturnContainers,
    SecurityDescriptorProvider,
};
