//! Conventional child names derived from field names.

use crate::constants::DEFAULT_ELEMENT_NAME;

/// Token-separated lowercase form of a field name.
///
/// Splits on `_`, `-`, spaces and lower-to-upper case boundaries:
/// `first_name`, `firstName` and `FirstName` all become `first-name`.
pub fn to_child_name(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len() + 4);
    let mut prev: Option<char> = None;
    for c in field_name.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            prev = None;
            continue;
        }
        if c.is_uppercase() {
            let boundary = matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit());
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Name of one element of a collection stored under `collection_name`.
pub fn singularize(collection_name: &str) -> String {
    let name = collection_name;
    let singular = if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = ["sses", "shes", "ches", "xes", "zes"]
        .iter()
        .find(|suffix| name.ends_with(*suffix))
        .map(|_| &name[..name.len() - 2])
    {
        stem.to_string()
    } else if name.ends_with('s') && !name.ends_with("ss") {
        name[..name.len() - 1].to_string()
    } else {
        String::new()
    };
    if singular.is_empty() || singular == name {
        DEFAULT_ELEMENT_NAME.to_string()
    } else {
        singular
    }
}
