//! Provider capability traits.
//!
//! The host drives a provider through a fixed set of verbs, grouped the way
//! the host groups them: items, containers, navigation, security
//! descriptors and properties. Verbs with a default body here are the ones
//! the host supplies itself; a provider only overrides what it proxies.

use async_trait::async_trait;
use remote_drive_core::{
    AccessControlSections, ItemWriter, RemoteObject, RemoteValue, SecurityDescriptor,
};

use crate::ProviderResult;

/// How container children should be reported by `get_child_names`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnContainers {
    /// Only containers matching the filter.
    #[default]
    ReturnMatchingContainers,
    /// All containers regardless of filter.
    ReturnAllContainers,
}

/// Single-item verbs.
#[async_trait]
pub trait ItemProvider: Send + Sync {
    /// Write the item at `path`.
    async fn get_item(&self, path: &str, out: &mut dyn ItemWriter) -> ProviderResult<()>;

    /// Whether `path` resolves to something.
    async fn path_exists(&self, path: &str) -> ProviderResult<bool>;

    /// Whether an item exists at `path`.
    async fn item_exists(&self, path: &str) -> ProviderResult<bool>;

    async fn set_item(&self, path: &str, _value: RemoteValue) -> ProviderResult<()> {
        tracing::debug!(path, "set_item: host default");
        Ok(())
    }

    async fn clear_item(&self, path: &str) -> ProviderResult<()> {
        tracing::debug!(path, "clear_item: host default");
        Ok(())
    }

    async fn invoke_default_action(&self, path: &str) -> ProviderResult<()> {
        tracing::debug!(path, "invoke_default_action: host default");
        Ok(())
    }
}

/// Verbs over items that hold other items.
#[async_trait]
pub trait ContainerProvider: ItemProvider {
    /// Write every child of `path`, descending when `recurse` is set.
    async fn get_child_items(
        &self,
        path: &str,
        recurse: bool,
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()>;

    /// Write the name of every child of `path`.
    async fn get_child_names(
        &self,
        path: &str,
        return_containers: ReturnContainers,
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()>;

    async fn has_child_items(&self, path: &str) -> ProviderResult<bool>;

    async fn copy_item(&self, path: &str, copy_path: &str, recurse: bool) -> ProviderResult<()> {
        tracing::debug!(path, copy_path, recurse, "copy_item: host default");
        Ok(())
    }

    async fn remove_item(&self, path: &str, recurse: bool) -> ProviderResult<()> {
        tracing::debug!(path, recurse, "remove_item: host default");
        Ok(())
    }

    async fn new_item(
        &self,
        path: &str,
        item_type: Option<&str>,
        _value: Option<RemoteValue>,
    ) -> ProviderResult<()> {
        tracing::debug!(path, ?item_type, "new_item: host default");
        Ok(())
    }

    async fn rename_item(&self, path: &str, new_name: &str) -> ProviderResult<()> {
        tracing::debug!(path, new_name, "rename_item: host default");
        Ok(())
    }
}

/// Verbs over a hierarchical namespace.
#[async_trait]
pub trait NavigationProvider: ContainerProvider {
    async fn is_item_container(&self, path: &str) -> ProviderResult<bool>;

    async fn move_item(&self, path: &str, destination: &str) -> ProviderResult<()> {
        tracing::debug!(path, destination, "move_item: host default");
        Ok(())
    }

    fn make_path(&self, parent: &str, child: &str) -> String {
        paths::make_path(parent, child)
    }

    fn parent_path(&self, path: &str, root: &str) -> String {
        paths::parent_path(path, root)
    }

    fn child_name(&self, path: &str) -> String {
        paths::child_name(path).to_owned()
    }

    fn normalize_relative_path(&self, path: &str, base_path: &str) -> String {
        paths::normalize_relative_path(path, base_path)
    }
}

/// Access-control verbs.
#[async_trait]
pub trait SecurityDescriptorProvider: Send + Sync {
    /// Write the descriptor of `path`.
    async fn get_security_descriptor(
        &self,
        path: &str,
        sections: AccessControlSections,
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()>;

    /// Apply `descriptor` to `path`.
    async fn set_security_descriptor(
        &self,
        path: &str,
        descriptor: SecurityDescriptor,
    ) -> ProviderResult<()>;

    async fn new_security_descriptor_from_path(
        &self,
        path: &str,
        sections: AccessControlSections,
    ) -> ProviderResult<SecurityDescriptor>;

    async fn new_security_descriptor_of_type(
        &self,
        type_name: &str,
        sections: AccessControlSections,
    ) -> ProviderResult<SecurityDescriptor>;
}

/// Item property verbs.
#[async_trait]
pub trait PropertyProvider: Send + Sync {
    /// Write the properties of `path`; all of them when `names` is empty.
    async fn get_property(
        &self,
        path: &str,
        names: &[String],
        out: &mut dyn ItemWriter,
    ) -> ProviderResult<()>;

    async fn get_property_dynamic_parameters(
        &self,
        path: &str,
        names: &[String],
    ) -> ProviderResult<Vec<RemoteObject>>;

    async fn set_property(&self, path: &str, value: RemoteObject) -> ProviderResult<()>;

    async fn set_property_dynamic_parameters(
        &self,
        path: &str,
        value: RemoteObject,
    ) -> ProviderResult<Option<RemoteObject>>;

    async fn clear_property(&self, path: &str, names: &[String]) -> ProviderResult<()>;

    async fn clear_property_dynamic_parameters(
        &self,
        path: &str,
        names: &[String],
    ) -> ProviderResult<Option<RemoteObject>>;
}

/// Path helpers the host supplies to every navigation provider.
///
/// Both `/` and `\` are accepted as separators; output uses `/`.
pub mod paths {
    const SEPARATOR: char = '/';

    fn is_separator(c: char) -> bool {
        c == '/' || c == '\\'
    }

    fn normalize(path: &str) -> String {
        path.replace('\\', "/")
    }

    /// Join `child` onto `parent` with exactly one separator.
    #[must_use]
    pub fn make_path(parent: &str, child: &str) -> String {
        let parent = normalize(parent);
        let child = normalize(child);
        if parent.is_empty() {
            return child;
        }
        if child.is_empty() {
            return parent;
        }
        format!(
            "{}{SEPARATOR}{}",
            parent.trim_end_matches(SEPARATOR),
            child.trim_start_matches(SEPARATOR)
        )
    }

    /// Parent of `path`, or empty when `path` is `root` or has no parent.
    #[must_use]
    pub fn parent_path(path: &str, root: &str) -> String {
        let path = normalize(path);
        let trimmed = path.trim_end_matches(SEPARATOR);
        let root = normalize(root);
        if trimmed.is_empty() || (!root.is_empty() && trimmed == root.trim_end_matches(SEPARATOR)) {
            return String::new();
        }
        match trimmed.rfind(SEPARATOR) {
            Some(0) => SEPARATOR.to_string(),
            Some(idx) => trimmed[..idx].to_owned(),
            None => String::new(),
        }
    }

    /// Last segment of `path`.
    #[must_use]
    pub fn child_name(path: &str) -> &str {
        let trimmed = path.trim_end_matches(is_separator);
        trimmed
            .rfind(is_separator)
            .map_or(trimmed, |idx| &trimmed[idx + 1..])
    }

    /// `path` relative to `base_path` when it lies beneath it.
    #[must_use]
    pub fn normalize_relative_path(path: &str, base_path: &str) -> String {
        let path = normalize(path);
        let base = normalize(base_path);
        let base = base.trim_end_matches(SEPARATOR);
        if base.is_empty() {
            return path;
        }
        match path.strip_prefix(base) {
            Some(rest) if rest.is_empty() || rest.starts_with(SEPARATOR) => {
                rest.trim_start_matches(SEPARATOR).to_owned()
            }
            _ => path,
        }
    }

}
