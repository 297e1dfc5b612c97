//! Call-site identity.
//!
//! A site is keyed by `file:line:function`. Every execution of the same
//! instrumented location maps to the same [`SiteId`], which is what makes
//! per-site aggregation work.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delimiter between the components of a site identifier.
pub const SITE_DELIMITER: char = ':';

/// Identifier of an instrumented call site: `file:line:function`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Derive the identifier for a source location.
    ///
    /// ```
    /// use cntryl_scope::SiteId;
    ///
    /// let site = SiteId::new("src/db.rs", 42, "flush");
    /// assert_eq!(site.as_str(), "src/db.rs:42:flush");
    /// ```
    pub fn new(file: &str, line: u32, function: &str) -> Self {
        Self(format!(
            "{file}{SITE_DELIMITER}{line}{SITE_DELIMITER}{function}"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SiteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reduce a `type_name` of a probe item nested in a function down to the
/// bare name of that function.
///
/// Used by [`function_name!`](crate::function_name); not meant to be called
/// directly.
#[doc(hidden)]
pub fn short_function_name(probe_type_name: &'static str) -> &'static str {
    let mut path = probe_type_name
        .strip_suffix(PROBE_SUFFIX)
        .unwrap_or(probe_type_name);
    // Markers inside closures resolve to the enclosing named function
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    match path.rfind("::") {
        Some(pos) => &path[pos + 2..],
        None => path,
    }
}

const PROBE_SUFFIX: &str = "::__cntryl_scope_probe";

/// Name of the enclosing function, resolved at compile time.
///
/// ```
/// fn flush_memtable() -> &'static str {
///     cntryl_scope::function_name!()
/// }
///
/// assert_eq!(flush_memtable(), "flush_memtable");
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __cntryl_scope_probe() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::__private::short_function_name(__type_name_of(__cntryl_scope_probe))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_join_components_with_colons() {
        let site = SiteId::new("src/lib.rs", 7, "main");
        assert_eq!(site.as_str(), "src/lib.rs:7:main");
        assert_eq!(site.to_string(), "src/lib.rs:7:main");
    }

    #[test]
    fn should_derive_identical_ids_for_identical_locations() {
        let a = SiteId::new("src/a.rs", 10, "run");
        let b = SiteId::new("src/a.rs", 10, "run");
        assert_eq!(a, b);
        assert_eq!(a.as_str().as_bytes(), b.as_str().as_bytes());
    }

    #[test]
    fn should_distinguish_ids_when_any_component_differs() {
        let base = SiteId::new("src/a.rs", 10, "run");
        assert_ne!(base, SiteId::new("src/b.rs", 10, "run"));
        assert_ne!(base, SiteId::new("src/a.rs", 11, "run"));
        assert_ne!(base, SiteId::new("src/a.rs", 10, "walk"));
    }

    #[test]
    fn should_strip_probe_and_module_path() {
        assert_eq!(
            short_function_name("my_crate::db::flush::__cntryl_scope_probe"),
            "flush"
        );
        assert_eq!(
            short_function_name("my_crate::db::flush::{{closure}}::{{closure}}::__cntryl_scope_probe"),
            "flush"
        );
        assert_eq!(short_function_name("bare"), "bare");
    }

    #[test]
    fn should_capture_enclosing_function_name() {
        assert_eq!(
            crate::function_name!(),
            "should_capture_enclosing_function_name"
        );
    }

    #[test]
    fn should_capture_function_name_from_inside_closure() {
        let name = (|| crate::function_name!())();
        assert_eq!(name, "should_capture_function_name_from_inside_closure");
    }
}
