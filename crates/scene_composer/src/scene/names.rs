//! Node-name matching rules
//!
//! Host scene systems disambiguate same-named nodes by appending a trailing
//! `.<digits>` suffix (`Probe`, `Probe.001`, `Probe.002`). Lookups in this
//! crate compare base names with that suffix stripped, so a description can
//! keep referring to `Probe` regardless of how the host renamed it.

/// Strip a trailing `.<digits>` de-duplication suffix, if present
///
/// Only the last suffix is removed: `Foo.001.002` becomes `Foo.001`.
pub fn base_name(name: &str) -> &str {
    if let Some(dot) = name.rfind('.') {
        let digits = &name[dot + 1..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return &name[..dot];
        }
    }
    name
}

/// True when two names share the same de-duplicated base name
pub fn same_base_name(a: &str, b: &str) -> bool {
    base_name(a) == base_name(b)
}

/// True when two names share the same base name, ignoring ASCII case
pub fn same_base_name_ignore_case(a: &str, b: &str) -> bool {
    base_name(a).eq_ignore_ascii_case(base_name(b))
}
