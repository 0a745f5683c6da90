//! The dispatcher: filesystem verbs proxied through a remote session.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use remote_drive_core::{
    AccessControlSections, ItemWriter, Pipeline, ProviderItem, RemoteObject, RemoteSession,
    RemoteValue, SecurityDescriptor,
};
use remote_drive_session::SessionBinding;

use crate::{
    ContainerProvider, ItemProvider, NavigationProvider, PropertyProvider, ProviderError,
    ProviderResult, ReturnContainers, SecurityDescriptorProvider, commands,
};

/// Proxies every provider verb to a remote session.
///
/// Each call builds its own [`Pipeline`], runs it in one round trip and
/// writes results as they stream back. Paths are passed through untouched
/// and emitted items carry the path the remote side reported.
#[derive(Debug)]
pub struct RemoteDriveProxy {
    binding: SessionBinding,
    local_name: String,
    remote_root: String,
}

impl RemoteDriveProxy {
    /// Create a dispatcher for drive `local_name` proxying `remote_root`.
    #[must_use]
    pub fn new(
        session: Arc<dyn RemoteSession>,
        local_name: impl Into<String>,
        remote_root: impl Into<String>,
    ) -> Self {
        Self {
            binding: SessionBinding::new(session),
            local_name: local_name.into(),
            remote_root: remote_root.into(),
        }
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[must_use]
    pub fn remote_root(&self) -> &str {
        &self.remote_root
    }

    /// The session calls currently go to.
    #[must_use]
    pub fn session(&self) -> Arc<dyn RemoteSession> {
        self.binding.current()
    }

    /// Point subsequent calls at another session.
    pub fn rebind_session(&self, session: Arc<dyn RemoteSession>) {
        self.binding.rebind(session);
    }

    /// Run `pipeline` and write one item per result.
    ///
    /// `value` picks what is emitted for each object; `container` forces the
    /// container flag instead of reading it from the object.
    async fn write_items<F>(
        &self,
        pipeline: Pipeline,
        out: &mut dyn ItemWriter,
        container: Option<bool>,
        value: F,
    ) -> ProviderResult<usize>
    where
        F: Fn(RemoteObject) -> ProviderResult<RemoteValue> + Send + Sync,
    {
        let mut results = self.binding.invoke(pipeline).await?;
        let mut written = 0;
        while let Some(obj) = results.next().await {
            let obj = obj?;
            let path = obj
                .path()
                .ok_or_else(|| ProviderError::malformed("PSPath", "missing or not a string"))?
                .to_owned();
            let is_container = match container {
                Some(forced) => forced,
                None => obj.is_container().ok_or_else(|| {
                    ProviderError::malformed("PSIsContainer", "missing or not a boolean")
                })?,
            };
            out.write_item(ProviderItem::new(value(obj)?, path, is_container));
            written += 1;
        }
        Ok(written)
    }

    /// Run `pipeline` and return its first result.
    async fn first_result(&self, pipeline: Pipeline) -> ProviderResult<Option<RemoteObject>> {
        let mut results = self.binding.invoke(pipeline).await?;
        Ok(results.next().await.transpose()?)
    }

    async fn scalar_bool(&self, command: String) -> ProviderResult<bool> {
        let obj = self
            .first_result(Pipeline::new().script(command))
            .await?
            .ok_or_else(|| ProviderError::malformed("base", "no result returned"))?;
        obj.base
            .as_bool()
            .ok_or_else(|| ProviderError::malformed("base", format!("expected boolean, got {}", obj.base)))
    }
}

fn whole_object(obj: RemoteObject) -> ProviderResult<RemoteValue> {
    Ok(RemoteValue::Object(obj))
}

fn name_of(obj: RemoteObject) -> ProviderResult<RemoteValue> {
    obj.name()
        .cloned()
        .map(RemoteValue::from)
        .ok_or_else(|| ProviderError::malformed("Name", "missing"))
}

#[async_trait]
impl ItemProvider for RemoteDriveProxy {
    async fn get_item(&self, path: &str, out: &mut dyn ItemWriter) -> ProviderResult<()> {
        tracing::debug!(drive = %self.local_name, path, "get_item");
        let pipeline = Pipeline::new().script(commands::get_item(path));
        self.write_items(pipeline, out, None, whole_object).await?;
        Ok(())
    }

    async fn path_exists(&self, path: &str) -> ProviderResult<bool> {
        tracing::debug!(drive = %self.local_name, path, "path_exists");
        self.scalar_bool(commands::test_path(path)).await
    }

    async fn item_exists(&self, path: &str) -> ProviderResult<bool> {
        self.path_exists(path).await
    }
}

#[async_trait]
impl ContainerProvider for RemoteDriveProxy {
    async fn get_child_items(
        &self,
        path: &str,
        recurse: bool,
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()> {
        tracing::debug!(drive = %self.local_name, path, recurse, "get_child_items");
        let pipeline = Pipeline::new().script(commands::list_children(path, recurse));
        let written = self.write_items(pipeline, out, None, whole_object).await?;
        tracing::debug!(path, written, "get_child_items done");
        Ok(())
    }

    async fn get_child_names(
        &self,
        path: &str,
        return_containers: ReturnContainers,
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()> {
        // The remote listing is never filtered here; the host applies it.
        tracing::debug!(drive = %self.local_name, path, ?return_containers, "get_child_names");
        let pipeline = Pipeline::new().script(commands::list_child_names(path));
        self.write_items(pipeline, out, None, name_of).await?;
        Ok(())
    }

    async fn has_child_items(&self, path: &str) -> ProviderResult<bool> {
        tracing::debug!(drive = %self.local_name, path, "has_child_items");
        let pipeline = Pipeline::new().script(commands::count_children(path));
        // Only an explicit zero count means empty.
        let Some(obj) = self.first_result(pipeline).await? else {
            return Ok(true);
        };
        let count = obj
            .base
            .as_i64()
            .ok_or_else(|| ProviderError::malformed("base", format!("expected count, got {}", obj.base)))?;
        Ok(count != 0)
    }
}

#[async_trait]
impl NavigationProvider for RemoteDriveProxy {
    async fn is_item_container(&self, path: &str) -> ProviderResult<bool> {
        tracing::debug!(drive = %self.local_name, path, "is_item_container");
        self.scalar_bool(commands::is_container(path)).await
    }
}

#[async_trait]
impl SecurityDescriptorProvider for RemoteDriveProxy {
    async fn get_security_descriptor(
        &self,
        path: &str,
        sections: AccessControlSections,
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()> {
        tracing::debug!(drive = %self.local_name, path, sections = sections.bits(), "get_security_descriptor");
        let pipeline = Pipeline::new().script(commands::get_acl(path, sections.includes_audit()));
        self.write_items(pipeline, out, Some(false), whole_object).await?;
        Ok(())
    }

    async fn set_security_descriptor(
        &self,
        path: &str,
        descriptor: SecurityDescriptor,
    ) -> ProviderResult<()> {
        tracing::debug!(drive = %self.local_name, path, "set_security_descriptor");
        let variable = self.binding.bind_variable(descriptor.into()).await?;

        let mut pipeline = Pipeline::new().script(commands::set_acl(path, &variable.reference()));
        variable.append_unbind(&mut pipeline);

        let outcome = async {
            let mut results = self.binding.invoke(pipeline).await?;
            while let Some(result) = results.next().await {
                result?;
            }
            Ok::<_, ProviderError>(())
        }
        .await;
        variable.settle(outcome).await
    }

    async fn new_security_descriptor_from_path(
        &self,
        path: &str,
        sections: AccessControlSections,
    ) -> ProviderResult<SecurityDescriptor> {
        tracing::debug!(drive = %self.local_name, path, "new_security_descriptor_from_path");
        Ok(self
            .binding
            .new_security_descriptor_from_path(path, sections)
            .await?)
    }

    async fn new_security_descriptor_of_type(
        &self,
        _type_name: &str,
        _sections: AccessControlSections,
    ) -> ProviderResult<SecurityDescriptor> {
        Err(ProviderError::NotImplemented("new_security_descriptor_of_type"))
    }
}

#[async_trait]
impl PropertyProvider for RemoteDriveProxy {
    async fn get_property(
        &self,
        path: &str,
        names: &[String],
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()> {
        tracing::debug!(drive = %self.local_name, path, ?names, "get_property");
        if !names.is_empty() {
            let pipeline = Pipeline::new().script(commands::get_property_by_names(path, names));
            self.write_items(pipeline, out, Some(false), whole_object).await?;
            return Ok(());
        }

        // No names given: collect every property member remotely first.
        let variable = self.binding.bind_variable(RemoteValue::List(Vec::new())).await?;
        let names_ref = variable.reference();

        let mut pipeline = Pipeline::new()
            .script(commands::property_names(&names_ref, path))
            .script(commands::get_property_by_ref(path, &names_ref));
        variable.append_unbind(&mut pipeline);

        let outcome = self
            .write_items(pipeline, out, Some(false), whole_object)
            .await
            .map(drop);
        variable.settle(outcome).await
    }

    async fn get_property_dynamic_parameters(
        &self,
        path: &str,
        names: &[String],
    ) -> ProviderResult<Vec<RemoteObject>> {
        tracing::debug!(drive = %self.local_name, path, ?names, "get_property_dynamic_parameters");
        let pipeline = Pipeline::new().script(commands::get_item_property(path));
        let results = self.binding.invoke(pipeline).await?;
        Ok(results.try_collect::<Vec<_>>().await?)
    }

    async fn set_property(&self, _path: &str, _value: RemoteObject) -> ProviderResult<()> {
        Err(ProviderError::NotImplemented("set_property"))
    }

    async fn set_property_dynamic_parameters(
        &self,
        _path: &str,
        _value: RemoteObject,
    ) -> ProviderResult<Option<RemoteObject>> {
        Err(ProviderError::NotImplemented("set_property_dynamic_parameters"))
    }

    async fn clear_property(&self, _path: &str, _names: &[String]) -> ProviderResult<()> {
        Err(ProviderError::NotImplemented("clear_property"))
    }

    async fn clear_property_dynamic_parameters(
        &self,
        _path: &str,
        _names: &[String],
    ) -> ProviderResult<Option<RemoteObject>> {
        Err(ProviderError::NotImplemented("clear_property_dynamic_parameters"))
    }
}

#[cfg(test)]
mod tests {
    use remote_drive_session::{MemorySession, SessionEvent};
    use serde_json::json;

    use super::*;

    fn proxy() -> (Arc<MemorySession>, RemoteDriveProxy) {
        let session = Arc::new(MemorySession::new("remote"));
        let proxy = RemoteDriveProxy::new(session.clone(), "R", "/data");
        (session, proxy)
    }

    fn invocations(session: &MemorySession) -> Vec<Vec<String>> {
        session
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Invoke(commands) => Some(commands),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_child_items_keep_reported_paths() {
        let (session, proxy) = proxy();
        session.respond(
            "Get-ChildItem -Path '/data' -Recurse:$false",
            vec![
                RemoteObject::item("FileSystem::/data/logs", true),
                RemoteObject::item("FileSystem::/elsewhere/link.txt", false),
            ],
        );

        let mut out = Vec::new();
        proxy.get_child_items("/data", false, &mut out).await.unwrap();

        assert_eq!(invocations(&session), [["Get-ChildItem -Path '/data' -Recurse:$false"]]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].path, "FileSystem::/data/logs");
        assert!(out[0].is_container);
        assert_eq!(out[1].path, "FileSystem::/elsewhere/link.txt");
        assert!(!out[1].is_container);
        assert_eq!(
            out[1].value,
            RemoteValue::Object(RemoteObject::item("FileSystem::/elsewhere/link.txt", false))
        );
    }

    #[tokio::test]
    async fn test_recurse_flag_is_interpolated() {
        let (session, proxy) = proxy();
        let mut out = Vec::new();
        proxy.get_child_items("/data", true, &mut out).await.unwrap();
        assert_eq!(session.commands(), ["Get-ChildItem -Path '/data' -Recurse:$true"]);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_child_names_emit_name_values() {
        let (session, proxy) = proxy();
        session.respond(
            "Get-ChildItem -Path '/data' | Select-Object",
            vec![
                RemoteObject::item("/data/a.txt", false).with_property("Name", "a.txt"),
                RemoteObject::item("/data/sub", true).with_property("Name", "sub"),
            ],
        );

        let mut out = Vec::new();
        proxy
            .get_child_names("/data", ReturnContainers::ReturnMatchingContainers, &mut out)
            .await
            .unwrap();

        assert_eq!(out[0], ProviderItem::new("a.txt", "/data/a.txt", false));
        assert_eq!(out[1], ProviderItem::new("sub", "/data/sub", true));
    }

    #[tokio::test]
    async fn test_child_names_ignore_container_mode() {
        let (session, proxy) = proxy();
        session.respond(
            "Get-ChildItem",
            vec![RemoteObject::item("/data/sub", true).with_property("Name", "sub")],
        );

        let mut matching = Vec::new();
        let mut all = Vec::new();
        proxy
            .get_child_names("/data", ReturnContainers::ReturnMatchingContainers, &mut matching)
            .await
            .unwrap();
        proxy
            .get_child_names("/data", ReturnContainers::ReturnAllContainers, &mut all)
            .await
            .unwrap();

        assert_eq!(matching, all);
        let commands = session.commands();
        assert_eq!(commands[0], commands[1]);
    }

    #[tokio::test]
    async fn test_get_item() {
        let (session, proxy) = proxy();
        session.respond("Get-Item -Path '/data/a.txt'", vec![RemoteObject::item("/data/a.txt", false)]);

        let mut out = Vec::new();
        proxy.get_item("/data/a.txt", &mut out).await.unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "/data/a.txt");
    }

    #[tokio::test]
    async fn test_missing_container_flag_is_malformed() {
        let (session, proxy) = proxy();
        session.respond(
            "Get-Item",
            vec![RemoteObject::new(json!(null)).with_property("PSPath", "/data/a.txt")],
        );

        let mut out = Vec::new();
        let err = proxy.get_item("/data/a.txt", &mut out).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResult { field: "PSIsContainer", .. }));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_has_children_reads_first_count() {
        let (session, proxy) = proxy();
        session.respond("(Get-ChildItem -Path '/full')", vec![RemoteObject::new(3), RemoteObject::new(0)]);
        session.respond("(Get-ChildItem -Path '/empty')", vec![RemoteObject::new(0), RemoteObject::new(5)]);

        assert!(proxy.has_child_items("/full").await.unwrap());
        assert!(!proxy.has_child_items("/empty").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_children_without_count_is_true() {
        let (session, proxy) = proxy();
        assert!(proxy.has_child_items("/nothing").await.unwrap());
        assert_eq!(session.commands(), ["(Get-ChildItem -Path '/nothing').Count"]);
    }

    #[tokio::test]
    async fn test_path_and_item_exists_agree() {
        let (session, proxy) = proxy();
        session.respond("Test-Path -Path '/data/a.txt'", vec![RemoteObject::new(true)]);
        session.respond("Test-Path -Path '/data/none'", vec![RemoteObject::new(false)]);

        for path in ["/data/a.txt", "/data/none"] {
            assert_eq!(
                proxy.path_exists(path).await.unwrap(),
                proxy.item_exists(path).await.unwrap()
            );
        }
        assert!(proxy.item_exists("/data/a.txt").await.unwrap());
        assert!(!proxy.item_exists("/data/none").await.unwrap());
    }

    #[tokio::test]
    async fn test_scalar_without_result_is_malformed() {
        let (_session, proxy) = proxy();
        let err = proxy.path_exists("/data").await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResult { field: "base", .. }));
    }

    #[tokio::test]
    async fn test_is_container() {
        let (session, proxy) = proxy();
        session.respond("(Get-Item -Path '/data').PSIsContainer", vec![RemoteObject::new(true)]);
        assert!(proxy.is_item_container("/data").await.unwrap());
    }

    #[tokio::test]
    async fn test_security_descriptor_audit_flag() {
        let (session, proxy) = proxy();
        session.respond("Get-Acl", vec![RemoteObject::item("/data", true).with_property("Sddl", "O:BA")]);

        let mut out = Vec::new();
        proxy
            .get_security_descriptor("/data", AccessControlSections::ALL, &mut out)
            .await
            .unwrap();
        proxy
            .get_security_descriptor(
                "/data",
                AccessControlSections::ACCESS | AccessControlSections::OWNER,
                &mut out,
            )
            .await
            .unwrap();

        assert_eq!(
            session.commands(),
            ["Get-Acl -Path '/data' -Audit", "Get-Acl -Path '/data'"]
        );
        // Descriptors are never containers, whatever the object says.
        assert!(out.iter().all(|item| !item.is_container));
    }

    #[tokio::test]
    async fn test_set_security_descriptor_sequence() {
        let (session, proxy) = proxy();
        let sd = SecurityDescriptor::new("O:BAG:BAD:(A;;FA;;;BA)", AccessControlSections::ACCESS);

        proxy.set_security_descriptor("/data", sd.clone()).await.unwrap();

        let events = session.events();
        assert_eq!(events.len(), 2);
        let SessionEvent::SetVariable { name, value } = &events[0] else {
            panic!("expected binding first, got {:?}", events[0]);
        };
        assert_eq!(value, &RemoteValue::SecurityDescriptor(sd));
        assert_eq!(
            events[1],
            SessionEvent::Invoke(vec![
                format!("Set-Acl -Path '/data' -AclObject ${name}"),
                format!("${name} = $null"),
                format!("Remove-Variable -Name {name}"),
            ])
        );
        assert!(session.variables().is_empty());
    }

    #[tokio::test]
    async fn test_set_security_descriptor_failure_releases_variable() {
        let (session, proxy) = proxy();
        session.fail_on("Set-Acl", "Access to the path is denied");
        let sd = SecurityDescriptor::new("O:BA", AccessControlSections::ACCESS);

        let err = proxy.set_security_descriptor("/data", sd).await.unwrap_err();

        assert!(matches!(err, ProviderError::Session(_)));
        assert!(session.variables().is_empty());
        assert!(matches!(session.events().last(), Some(SessionEvent::RemoveVariable(_))));
    }

    #[tokio::test]
    async fn test_new_descriptor_from_path_delegates() {
        let (session, proxy) = proxy();
        session.set_descriptor("/data", SecurityDescriptor::new("O:BA", AccessControlSections::ALL));

        let sd = proxy
            .new_security_descriptor_from_path("/data", AccessControlSections::OWNER)
            .await
            .unwrap();

        assert_eq!(sd.sddl, "O:BA");
        assert!(session.commands().is_empty());
    }

    #[tokio::test]
    async fn test_get_property_routes() {
        let (session, proxy) = proxy();
        let row = RemoteObject::item("/data/a.txt", false)
            .with_property("Length", 42)
            .with_property("Mode", "-a---");
        session.respond("Get-ItemProperty -Path '/data/a.txt' -Name", vec![row]);

        let mut introspected = Vec::new();
        proxy.get_property("/data/a.txt", &[], &mut introspected).await.unwrap();

        let names = vec!["Length".to_owned(), "Mode".to_owned()];
        let mut literal = Vec::new();
        proxy.get_property("/data/a.txt", &names, &mut literal).await.unwrap();

        assert_eq!(introspected, literal);
        assert_eq!(literal.len(), 1);
        assert!(!literal[0].is_container);

        let calls = invocations(&session);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 4);
        assert!(calls[0][0].contains("Get-Member -MemberType *Property"));
        assert!(calls[0][1].starts_with("Get-ItemProperty -Path '/data/a.txt' -Name $"));
        assert!(calls[0][3].starts_with("Remove-Variable -Name "));
        assert_eq!(calls[1], ["Get-ItemProperty -Path '/data/a.txt' -Name 'Length','Mode'"]);
        assert!(session.variables().is_empty());
    }

    #[tokio::test]
    async fn test_get_property_failure_releases_variable() {
        let (session, proxy) = proxy();
        session.fail_on("Get-ItemProperty -Path '/data/a.txt' -Name", "Property does not exist");

        let mut out = Vec::new();
        assert!(proxy.get_property("/data/a.txt", &[], &mut out).await.is_err());
        assert!(session.variables().is_empty());
    }

    #[tokio::test]
    async fn test_property_dynamic_parameters() {
        let (session, proxy) = proxy();
        session.respond("Get-ItemProperty -Path '/data'", vec![RemoteObject::item("/data", true)]);

        let params = proxy.get_property_dynamic_parameters("/data", &[]).await.unwrap();
        assert_eq!(params, vec![RemoteObject::item("/data", true)]);
    }

    #[tokio::test]
    async fn test_unimplemented_verbs_never_reach_session() {
        let (session, proxy) = proxy();
        let names = vec!["Length".to_owned()];

        assert!(matches!(
            proxy.set_property("/data", RemoteObject::new(json!({}))).await,
            Err(ProviderError::NotImplemented("set_property"))
        ));
        assert!(matches!(
            proxy.clear_property("/data", &names).await,
            Err(ProviderError::NotImplemented("clear_property"))
        ));
        assert!(matches!(
            proxy.set_property_dynamic_parameters("/data", RemoteObject::new(json!({}))).await,
            Err(ProviderError::NotImplemented(_))
        ));
        assert!(matches!(
            proxy.clear_property_dynamic_parameters("/data", &names).await,
            Err(ProviderError::NotImplemented(_))
        ));
        assert!(matches!(
            proxy.new_security_descriptor_of_type("file", AccessControlSections::ALL).await,
            Err(ProviderError::NotImplemented(_))
        ));
        assert!(session.events().is_empty());
    }

    #[tokio::test]
    async fn test_structural_verbs_use_host_defaults() {
        let (session, proxy) = proxy();
        proxy.copy_item("/data/a", "/data/b", false).await.unwrap();
        proxy.move_item("/data/a", "/data/c").await.unwrap();
        proxy.rename_item("/data/a", "d").await.unwrap();
        proxy.new_item("/data/e", Some("file"), None).await.unwrap();
        proxy.remove_item("/data/a", true).await.unwrap();
        proxy.clear_item("/data/a").await.unwrap();
        proxy.set_item("/data/a", RemoteValue::Null).await.unwrap();
        assert!(session.events().is_empty());
        assert_eq!(proxy.make_path("/data", "a"), "/data/a");
    }

    #[tokio::test]
    async fn test_rebind_moves_subsequent_calls() {
        let (first, proxy) = proxy();
        let second = Arc::new(MemorySession::new("second"));
        second.respond("Test-Path", vec![RemoteObject::new(true)]);

        proxy.rebind_session(second.clone());
        assert!(proxy.path_exists("/data").await.unwrap());
        assert!(first.events().is_empty());
        assert_eq!(proxy.session().name(), "second");
    }

    #[tokio::test]
    async fn test_torn_session_fails_every_call() {
        let (session, proxy) = proxy();
        session.disconnect();

        let mut out = Vec::new();
        assert!(matches!(
            proxy.get_child_items("/data", false, &mut out).await,
            Err(ProviderError::Session(remote_drive_core::SessionError::Disconnected))
        ));
        assert!(proxy.set_security_descriptor("/data", SecurityDescriptor::new("", AccessControlSections::NONE)).await.is_err());
    }
}
