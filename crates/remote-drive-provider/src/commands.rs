//! Command templates for each proxied verb.
//!
//! Paths are interpolated as single-quoted literals; everything else that
//! is not a plain token travels through a transient variable.

use remote_drive_core::pipeline::{bool_literal, literal_list, quote_literal};

#[must_use]
pub fn list_children(path: &str, recurse: bool) -> String {
    format!(
        "Get-ChildItem -Path {} -Recurse:{}",
        quote_literal(path),
        bool_literal(recurse)
    )
}

#[must_use]
pub fn list_child_names(path: &str) -> String {
    format!(
        "Get-ChildItem -Path {} | Select-Object Name,PSPath,PSIsContainer",
        quote_literal(path)
    )
}

#[must_use]
pub fn get_item(path: &str) -> String {
    format!("Get-Item -Path {}", quote_literal(path))
}

#[must_use]
pub fn count_children(path: &str) -> String {
    format!("(Get-ChildItem -Path {}).Count", quote_literal(path))
}

#[must_use]
pub fn test_path(path: &str) -> String {
    format!("Test-Path -Path {}", quote_literal(path))
}

#[must_use]
pub fn is_container(path: &str) -> String {
    format!("(Get-Item -Path {}).PSIsContainer", quote_literal(path))
}

/// `Get-Acl`, with `-Audit` when the audit section is requested.
#[must_use]
pub fn get_acl(path: &str, audit: bool) -> String {
    let mut command = format!("Get-Acl -Path {}", quote_literal(path));
    if audit {
        command.push_str(" -Audit");
    }
    command
}

/// `Set-Acl` applying the descriptor held in `descriptor_ref`.
#[must_use]
pub fn set_acl(path: &str, descriptor_ref: &str) -> String {
    format!(
        "Set-Acl -Path {} -AclObject {descriptor_ref}",
        quote_literal(path)
    )
}

/// Fill `names_ref` with the names of every property member of `path`.
#[must_use]
pub fn property_names(names_ref: &str, path: &str) -> String {
    format!(
        "{names_ref} = (Get-ItemProperty -Path {} | Get-Member -MemberType *Property | Select-Object -ExpandProperty Name)",
        quote_literal(path)
    )
}

/// Properties of `path` named by the variable `names_ref`.
#[must_use]
pub fn get_property_by_ref(path: &str, names_ref: &str) -> String {
    format!("Get-ItemProperty -Path {} -Name {names_ref}", quote_literal(path))
}

/// Properties of `path` named literally.
#[must_use]
pub fn get_property_by_names<S: AsRef<str>>(path: &str, names: &[S]) -> String {
    format!(
        "Get-ItemProperty -Path {} -Name {}",
        quote_literal(path),
        literal_list(names)
    )
}

#[must_use]
pub fn get_item_property(path: &str) -> String {
    format!("Get-ItemProperty -Path {}", quote_literal(path))
}
