//! Drive binding and the table of mounted drives.

use std::{collections::HashMap, sync::Arc};

use remote_drive_core::RemoteSession;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{ProviderError, ProviderResult, RemoteDriveProxy};

/// What the host knows about a drive: its local name and the remote root
/// it proxies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveInfo {
    /// Local drive name.
    pub name: String,
    /// Remote path the drive proxies.
    pub root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DriveInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Parameters supplied when a drive is created.
#[derive(Clone)]
pub struct DriveParameters {
    session: Arc<dyn RemoteSession>,
}

impl DriveParameters {
    #[must_use]
    pub fn new(session: Arc<dyn RemoteSession>) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn builder() -> DriveParametersBuilder {
        DriveParametersBuilder::default()
    }

    #[must_use]
    pub fn session(&self) -> &Arc<dyn RemoteSession> {
        &self.session
    }
}

impl std::fmt::Debug for DriveParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveParameters")
            .field("session", &self.session.name())
            .finish()
    }
}

/// Builder for [`DriveParameters`].
#[derive(Default)]
pub struct DriveParametersBuilder {
    session: Option<Arc<dyn RemoteSession>>,
}

impl DriveParametersBuilder {
    #[must_use]
    pub fn session(mut self, session: Arc<dyn RemoteSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// # Errors
    /// Returns error if no session was given.
    pub fn build(self) -> ProviderResult<DriveParameters> {
        self.session
            .map(DriveParameters::new)
            .ok_or(ProviderError::MissingParameter("session"))
    }
}

/// A mounted drive and the dispatcher serving it.
#[derive(Debug)]
pub struct RemoteDrive {
    info: DriveInfo,
    provider: Arc<RemoteDriveProxy>,
}

impl RemoteDrive {
    #[must_use]
    pub fn new(info: DriveInfo, params: DriveParameters) -> Self {
        let provider = RemoteDriveProxy::new(params.session, info.name.clone(), info.root.clone());
        Self {
            info,
            provider: Arc::new(provider),
        }
    }

    #[must_use]
    pub const fn info(&self) -> &DriveInfo {
        &self.info
    }

    #[must_use]
    pub const fn provider(&self) -> &Arc<RemoteDriveProxy> {
        &self.provider
    }
}

impl RemoteDriveProxy {
    /// Host hook for drive creation.
    #[must_use]
    pub fn new_drive(info: DriveInfo, params: DriveParameters) -> RemoteDrive {
        tracing::info!(drive = %info.name, root = %info.root, session = params.session.name(), "Mounting remote drive");
        RemoteDrive::new(info, params)
    }

    /// Host hook for drive removal.
    #[must_use]
    pub fn remove_drive(drive: RemoteDrive) -> DriveInfo {
        tracing::info!(drive = %drive.info.name, "Removing remote drive");
        drive.info
    }
}

/// Drives mounted by name.
#[derive(Debug, Default)]
pub struct DriveTable {
    drives: RwLock<HashMap<String, Arc<RemoteDrive>>>,
}

impl DriveTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a new drive.
    ///
    /// # Errors
    /// Returns error if a drive with the same name is mounted.
    pub async fn new_drive(
        &self,
        info: DriveInfo,
        params: DriveParameters,
    ) -> ProviderResult<Arc<RemoteDrive>> {
        let mut drives = self.drives.write().await;
        if drives.contains_key(&info.name) {
            return Err(ProviderError::DriveExists(info.name));
        }
        let name = info.name.clone();
        let drive = Arc::new(RemoteDriveProxy::new_drive(info, params));
        drives.insert(name, Arc::clone(&drive));
        Ok(drive)
    }

    /// Unmount a drive, returning its info.
    ///
    /// # Errors
    /// Returns error if no such drive is mounted.
    pub async fn remove_drive(&self, name: &str) -> ProviderResult<DriveInfo> {
        let drive = self
            .drives
            .write()
            .await
            .remove(name)
            .ok_or_else(|| ProviderError::DriveNotFound(name.to_owned()))?;
        tracing::info!(drive = name, "Removing remote drive");
        Ok(drive.info.clone())
    }

    /// Look up a mounted drive.
    pub async fn get(&self, name: &str) -> Option<Arc<RemoteDrive>> {
        self.drives.read().await.get(name).map(Arc::clone)
    }

    /// Names of mounted drives, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.drives.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
