//! Selection helpers over collections of type definitions.

use regex::Regex;

use crate::{
    metadata::typesystem::{TypeDefList, TypeDefRc},
    Result,
};

/// Filters over a slice of type definitions.
///
/// All methods keep the input order and return new vectors.
///
/// # Examples
///
/// ```rust
/// use dotmetrics::{metadata::typesystem::TypeBuilder, project::TypeQuery};
///
/// let types = vec![
///     TypeBuilder::interface("App", "IService", "App").build(),
///     TypeBuilder::class("App", "Service", "App").build(),
/// ];
///
/// assert_eq!(types.interfaces_only().len(), 1);
/// assert_eq!(types.filtered("Service$")?.len(), 2);
/// # Ok::<(), dotmetrics::Error>(())
/// ```
pub trait TypeQuery {
    /// Interfaces only
    fn interfaces_only(&self) -> TypeDefList;

    /// Everything that is not an interface
    fn classes_only(&self) -> TypeDefList;

    /// Types whose full name matches the pattern
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if the pattern does not compile
    fn filtered(&self, pattern: &str) -> Result<TypeDefList>;

    /// The types followed by their nested types, recursively
    fn including_nested(&self) -> TypeDefList;

    /// Types declaring at least one of the given interfaces
    fn with_interface(&self, interfaces: &[TypeDefRc]) -> TypeDefList;

    /// Types carrying a custom attribute whose full name matches the pattern
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if the pattern does not compile
    fn with_attribute(&self, pattern: &str) -> Result<TypeDefList>;
}

impl TypeQuery for [TypeDefRc] {
    fn interfaces_only(&self) -> TypeDefList {
        self.iter().filter(|ty| ty.is_interface()).cloned().collect()
    }

    fn classes_only(&self) -> TypeDefList {
        self.iter().filter(|ty| ty.is_class()).cloned().collect()
    }

    fn filtered(&self, pattern: &str) -> Result<TypeDefList> {
        let pattern = Regex::new(pattern)?;
        Ok(self
            .iter()
            .filter(|ty| pattern.is_match(ty.full_name()))
            .cloned()
            .collect())
    }

    fn including_nested(&self) -> TypeDefList {
        self.iter().flat_map(|ty| ty.with_nested()).collect()
    }

    fn with_interface(&self, interfaces: &[TypeDefRc]) -> TypeDefList {
        self.iter()
            .filter(|ty| {
                ty.interfaces.iter().any(|declared| {
                    interfaces
                        .iter()
                        .any(|wanted| declared.key() == wanted.key())
                })
            })
            .cloned()
            .collect()
    }

    fn with_attribute(&self, pattern: &str) -> Result<TypeDefList> {
        let pattern = Regex::new(pattern)?;
        Ok(self
            .iter()
            .filter(|ty| {
                ty.custom_attributes
                    .iter()
                    .any(|attribute| pattern.is_match(attribute.full_name()))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{TypeBuilder, TypeRef};

    #[test]
    fn queries() {
        let service = TypeBuilder::interface("App", "IService", "App").build();
        let route = TypeRef::parse("App.Web.RouteAttribute", "App");
        let types = vec![
            service.clone(),
            TypeBuilder::class("App", "Service", "App")
                .implements(service.reference().clone())
                .nested("Options", |options| options)
                .build(),
            TypeBuilder::class("App", "HomeController", "App")
                .attribute(route)
                .build(),
        ];

        assert_eq!(types.interfaces_only().len(), 1);
        assert_eq!(types.classes_only().len(), 2);
        assert_eq!(types.including_nested().len(), 4);
        assert_eq!(types.filtered("Controller$").unwrap().len(), 1);
        assert!(types.filtered("[").is_err());

        let implementing = types.with_interface(&[service]);
        assert_eq!(implementing[0].full_name(), "App.Service");

        let routed = types.with_attribute("Route").unwrap();
        assert_eq!(routed[0].full_name(), "App.HomeController");
    }
}
