//! Configuration of a usage analysis run.

use crate::analysis::{MethodFilter, TypeFilter};

/// Configuration of a usage analysis run.
///
/// The type filter selects which relation targets are reported and which types the
/// traversal continues into; the method filter selects whose bodies and signatures are
/// inspected.
///
/// # Examples
///
/// ```rust
/// use dotmetrics::analysis::{TypeFilter, UsageOptions};
///
/// let options = UsageOptions::new()
///     .exclude_namespaces(&["App.Generated"])
///     .with_type_filter(TypeFilter::matching("^App\\.")?);
/// # Ok::<(), dotmetrics::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct UsageOptions {
    /// Applied to relation targets and traversal successors
    pub type_filter: TypeFilter,
    /// Applied to the methods of visited types
    pub method_filter: MethodFilter,
}

impl UsageOptions {
    /// Default options: standard library excluded, every method inspected
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the type filter
    #[must_use]
    pub fn with_type_filter(mut self, filter: TypeFilter) -> Self {
        self.type_filter = filter;
        self
    }

    /// Replace the method filter
    #[must_use]
    pub fn with_method_filter(mut self, filter: MethodFilter) -> Self {
        self.method_filter = filter;
        self
    }

    /// Additionally exclude the given namespaces
    #[must_use]
    pub fn exclude_namespaces<S: AsRef<str>>(mut self, namespaces: &[S]) -> Self {
        self.type_filter = self
            .type_filter
            .and(TypeFilter::excluding_namespaces(namespaces));
        self
    }
}
