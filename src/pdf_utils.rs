//! Small lopdf helpers shared by the codec and the validator.

use lopdf::{Dictionary, Document, Object};

/// Keys a page may inherit from an ancestor `/Pages` node.
pub const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against `/Parent` cycles in broken page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Resolve a value that might be inline or a reference to a dictionary.
pub fn resolve_dict<'a>(document: &'a Document, value: &'a Object) -> Option<&'a Dictionary> {
    match value {
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        other => other.as_dict().ok(),
    }
}

/// Returns the name stored under `key`, if any, as a lossy UTF-8 string.
pub fn name_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_name().ok())
        .map(|s| String::from_utf8_lossy(s).into_owned())
}

/// Walk `/Parent` links upwards from `page` and return the first value stored
/// under `key`.
pub fn inherited_attribute<'a>(
    document: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = document.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

/// Whether `object` is an intermediate node of a page tree.
pub fn is_pages_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => dict.has_type(b"Pages"),
        _ => false,
    }
}
