//! Names and qualified names.
//!
//! A qualified name is `<namespace>.<name>`; namespaces may themselves
//! contain dots (`Org.OData.Core.V1.Description`), so the split is always
//! on the *last* dot.

use smol_str::{SmolStr, format_smolstr};

/// An element name. Short names are stored inline, so cloning is cheap.
pub type Name = SmolStr;

/// Split `Namespace.Name` into `("Namespace", "Name")`.
///
/// Returns `None` for names without a namespace part.
pub fn split_qualified(qualified: &str) -> Option<(&str, &str)> {
    let (namespace, name) = qualified.rsplit_once('.')?;
    if namespace.is_empty() || name.is_empty() {
        return None;
    }
    Some((namespace, name))
}

/// Join a namespace and a simple name.
pub fn qualify(namespace: &str, name: &str) -> Name {
    if namespace.is_empty() {
        SmolStr::new(name)
    } else {
        format_smolstr!("{namespace}.{name}")
    }
}

/// Check that `name` is a simple identifier (XID rules, leading `_` allowed).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}
