//! Demo mounting a remote drive over a scripted in-memory session.
//!
//! Run with: RUST_LOG=debug cargo run -p drive-shell-demo

use std::sync::Arc;

use futures::StreamExt;
use remote_drive_core::{AccessControlSections, ItemChannel, RemoteObject, SecurityDescriptor};
use remote_drive_provider::{
    ContainerProvider, DriveInfo, DriveParameters, DriveTable, ItemProvider, PropertyProvider,
    SecurityDescriptorProvider,
};
use remote_drive_session::MemorySession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn seeded_session() -> Arc<MemorySession> {
    let session = Arc::new(MemorySession::new("demo-host"));
    session.respond(
        "Get-ChildItem -Path '/srv/data' -Recurse:",
        vec![
            RemoteObject::item("FileSystem::/srv/data/logs", true).with_property("Name", "logs"),
            RemoteObject::item("FileSystem::/srv/data/readme.txt", false)
                .with_property("Name", "readme.txt")
                .with_property("Length", 1024),
        ],
    );
    session.respond("(Get-ChildItem -Path '/srv/data').Count", vec![RemoteObject::new(2)]);
    session.respond("Test-Path -Path '/srv/data", vec![RemoteObject::new(true)]);
    session.respond(
        "Get-ItemProperty -Path '/srv/data/readme.txt' -Name",
        vec![
            RemoteObject::item("FileSystem::/srv/data/readme.txt", false)
                .with_property("Length", 1024)
                .with_property("Mode", "-a---"),
        ],
    );
    session.respond(
        "Get-Acl -Path '/srv/data'",
        vec![RemoteObject::item("FileSystem::/srv/data", true).with_property("Sddl", "O:BAG:BAD:(A;;FA;;;BA)")],
    );
    session.set_descriptor(
        "/srv/data",
        SecurityDescriptor::new("O:BAG:BAD:(A;;FA;;;BA)", AccessControlSections::ALL),
    );
    session
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let session = seeded_session();
    let table = DriveTable::new();
    let params = DriveParameters::builder().session(session.clone()).build()?;
    let drive = table
        .new_drive(DriveInfo::new("R", "/srv/data").with_description("demo drive"), params)
        .await?;
    let provider = drive.provider();

    let (mut writer, mut items) = ItemChannel::new();
    provider.get_child_items("/srv/data", false, &mut writer).await?;
    provider.get_property("/srv/data/readme.txt", &[], &mut writer).await?;
    provider
        .get_security_descriptor("/srv/data", AccessControlSections::ALL, &mut writer)
        .await?;
    drop(writer);

    while let Some(item) = items.next().await {
        println!("{}", serde_json::to_string(&item)?);
    }

    tracing::info!(
        exists = provider.item_exists("/srv/data").await?,
        has_children = provider.has_child_items("/srv/data").await?,
        "Drive root"
    );

    let sd = provider
        .new_security_descriptor_from_path("/srv/data", AccessControlSections::ACCESS)
        .await?;
    provider.set_security_descriptor("/srv/data", sd).await?;
    tracing::info!(
        commands = session.commands().len(),
        leaked_variables = session.variables().len(),
        "Session activity"
    );

    let info = table.remove_drive("R").await?;
    tracing::info!(drive = %info.name, "Unmounted");
    Ok(())
}
