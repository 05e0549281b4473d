//! Record name conversions between desired state and the API
//!
//! Desired state uses zone-relative names with `@` for the apex. The API
//! expects an empty name for the apex and may answer with fully-qualified
//! names (`www.example.com`, `example.com.`).

use crate::model::APEX;

/// Convert a desired-state name to the API form (`@` → empty)
pub fn to_api_name(name: &str) -> String {
    if name == APEX {
        String::new()
    } else {
        name.to_string()
    }
}

/// Convert an API name to the desired-state form (empty → `@`)
pub fn from_api_name(name: &str) -> String {
    if name.is_empty() {
        APEX.to_string()
    } else {
        name.to_string()
    }
}

/// Make `name` relative to `zone`, in desired-state form.
///
/// A trailing root dot is dropped, `zone` itself becomes `@`, and a
/// `.{zone}` suffix is stripped. Comparison is ASCII case-insensitive.
/// Names outside the zone are returned unchanged.
pub fn zone_relative(name: &str, zone: &str) -> String {
    let name = name.strip_suffix('.').unwrap_or(name);
    let zone = zone.strip_suffix('.').unwrap_or(zone);

    if zone.is_empty() {
        return from_api_name(name);
    }
    if name.eq_ignore_ascii_case(zone) {
        return APEX.to_string();
    }

    // `.{zone}` suffix; byte-slice on an ASCII-checked boundary
    if name.len() > zone.len() + 1 {
        let split = name.len() - zone.len();
        if name.is_char_boundary(split - 1)
            && name[split - 1..].starts_with('.')
            && name[split..].eq_ignore_ascii_case(zone)
        {
            return from_api_name(&name[..split - 1]);
        }
    }

    from_api_name(name)
}
