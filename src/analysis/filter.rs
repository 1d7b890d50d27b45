//! Type and method filters for the usage analysis.
//!
//! Filters are cheap to clone and safe to share between threads. A [`TypeFilter`] decides
//! which relation targets are kept and, at the same time, which types the traversal
//! continues into.

use std::{fmt, sync::Arc};

use regex::Regex;

use crate::{
    metadata::{method::MethodDef, typesystem::TypeRef},
    Result,
};

/// Namespaces of the base class library, excluded by the default type filter
pub const STANDARD_NAMESPACES: &[&str] = &["System", "Microsoft"];

/// True if `namespace` is `prefix` or lies below it
fn in_namespace(namespace: &str, prefix: &str) -> bool {
    namespace
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// A predicate over type references.
///
/// # Examples
///
/// ```rust
/// use dotmetrics::{analysis::TypeFilter, metadata::typesystem::TypeRef};
///
/// let filter = TypeFilter::default();
/// assert!(filter.matches(&TypeRef::plain("App", "Service", "App")));
/// assert!(!filter.matches(&TypeRef::plain("System.Collections.Generic", "List`1", "System.Runtime")));
///
/// let services = TypeFilter::matching("Service$")?;
/// assert!(services.matches(&TypeRef::plain("App", "OrderService", "App")));
/// # Ok::<(), dotmetrics::Error>(())
/// ```
#[derive(Clone)]
pub struct TypeFilter(Arc<dyn Fn(&TypeRef) -> bool + Send + Sync>);

impl TypeFilter {
    /// Wrap a predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&TypeRef) -> bool + Send + Sync + 'static,
    {
        TypeFilter(Arc::new(predicate))
    }

    /// Accept every type
    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    /// Reject types in any of the namespaces or below them
    pub fn excluding_namespaces<S: AsRef<str>>(namespaces: &[S]) -> Self {
        let namespaces: Vec<String> = namespaces.iter().map(|n| n.as_ref().to_string()).collect();
        Self::new(move |ty| {
            !namespaces
                .iter()
                .any(|namespace| in_namespace(ty.namespace(), namespace))
        })
    }

    /// Accept only types in one of the namespaces or below them
    pub fn including_namespaces<S: AsRef<str>>(namespaces: &[S]) -> Self {
        let namespaces: Vec<String> = namespaces.iter().map(|n| n.as_ref().to_string()).collect();
        Self::new(move |ty| {
            namespaces
                .iter()
                .any(|namespace| in_namespace(ty.namespace(), namespace))
        })
    }

    /// Accept types whose full name matches the pattern
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if the pattern does not compile
    pub fn matching(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        Ok(Self::new(move |ty| pattern.is_match(ty.full_name())))
    }

    /// Reject types whose full name matches the pattern
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if the pattern does not compile
    pub fn excluding(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        Ok(Self::new(move |ty| !pattern.is_match(ty.full_name())))
    }

    /// Accept types both filters accept
    #[must_use]
    pub fn and(self, other: TypeFilter) -> Self {
        Self::new(move |ty| self.matches(ty) && other.matches(ty))
    }

    /// Apply the filter
    pub fn matches(&self, ty: &TypeRef) -> bool {
        (self.0)(ty)
    }
}

impl Default for TypeFilter {
    /// Excludes the [`STANDARD_NAMESPACES`]
    fn default() -> Self {
        Self::excluding_namespaces(STANDARD_NAMESPACES)
    }
}

impl fmt::Debug for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeFilter")
    }
}

/// A predicate over method definitions
#[derive(Clone)]
pub struct MethodFilter(Arc<dyn Fn(&MethodDef) -> bool + Send + Sync>);

impl MethodFilter {
    /// Wrap a predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&MethodDef) -> bool + Send + Sync + 'static,
    {
        MethodFilter(Arc::new(predicate))
    }

    /// Accept every method
    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    /// Accept methods whose name matches the pattern
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if the pattern does not compile
    pub fn matching(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        Ok(Self::new(move |method| pattern.is_match(&method.name)))
    }

    /// Apply the filter
    pub fn matches(&self, method: &MethodDef) -> bool {
        (self.0)(method)
    }
}

impl Default for MethodFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl fmt::Debug for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MethodFilter")
    }
}
