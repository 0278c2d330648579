//! Name lookup seam between the parsers and whatever knows about classes.

use crate::event::TypeParam;
use crate::types::ClassType;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Package(String),
    /// A class by canonical name, with `.` separating nested types.
    Class(String),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Package(name) | Entity::Class(name) => name,
        }
    }

    pub fn resolve_as_type(&self) -> Option<ClassType> {
        match self {
            Entity::Class(name) => Some(ClassType::new(name.clone())),
            Entity::Package(_) => None,
        }
    }

    /// Qualified name of a member of this entity.
    pub fn member(&self, name: &str) -> String {
        format!("{}.{}", self.name(), name)
    }
}

/// Lexical context of a type reference: the enclosing types, outermost first,
/// and the type parameters in scope, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveContext {
    pub enclosing_types: Vec<String>,
    pub type_parameters: Vec<TypeParam>,
}

impl ResolveContext {
    /// Index of the innermost type parameter called `name`.
    pub fn type_parameter(&self, name: &str) -> Option<usize> {
        self.type_parameters
            .iter()
            .rposition(|param| param.name.text == name)
    }

    /// A copy in which the parameter at `index` and every later one lose
    /// their bounds. Bounds are resolved in this context so that a parameter
    /// mentioning itself (`T extends Comparable<T>`) does not recurse.
    pub fn without_bounds_from(&self, index: usize) -> ResolveContext {
        let mut context = self.clone();
        for param in context.type_parameters.iter_mut().skip(index) {
            param.bound.clear();
        }
        context
    }
}

pub trait EntityResolver {
    /// Looks up a simple name as a package or class, as seen from `context`.
    fn resolve_package_or_class(&self, name: &str, context: &ResolveContext) -> Option<Entity>;

    /// Looks up a member package or class of `parent`.
    fn sub_entity(&self, parent: &Entity, name: &str) -> Option<Entity>;
}

impl<T: EntityResolver + ?Sized> EntityResolver for &T {
    fn resolve_package_or_class(&self, name: &str, context: &ResolveContext) -> Option<Entity> {
        (**self).resolve_package_or_class(name, context)
    }

    fn sub_entity(&self, parent: &Entity, name: &str) -> Option<Entity> {
        (**self).sub_entity(parent, name)
    }
}

/// Resolves a dotted name one segment at a time.
pub fn resolve_qualified(
    resolver: &dyn EntityResolver,
    name: &str,
    context: &ResolveContext,
) -> Option<Entity> {
    let mut segments = name.split('.');
    let first = segments.next()?;
    let mut entity = resolver.resolve_package_or_class(first, context)?;
    for segment in segments {
        entity = resolver.sub_entity(&entity, segment)?;
    }
    Some(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::LocatableToken;

    #[test]
    fn test_innermost_type_parameter_wins() {
        let outer = TypeParam::new(LocatableToken::new("T", 1, 9));
        let mut inner = TypeParam::new(LocatableToken::new("T", 3, 6));
        inner.bound = vec![LocatableToken::new("Number", 3, 16)];
        let context = ResolveContext {
            enclosing_types: vec!["a.A".to_string()],
            type_parameters: vec![outer, inner],
        };
        assert_eq!(context.type_parameter("T"), Some(1));
        assert_eq!(context.type_parameter("U"), None);

        let unbounded = context.without_bounds_from(1);
        assert!(unbounded.type_parameters[1].bound.is_empty());
        assert_eq!(context.type_parameters[1].bound.len(), 1);
    }
}
