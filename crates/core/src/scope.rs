//! Name lookup as seen from inside one compilation unit.
//!
//! Lookup order for a simple name: member types of the enclosing types
//! (innermost first) and the enclosing types themselves, top-level types of
//! this unit, single-type imports, the unit's package, on-demand imports,
//! `java.lang`, and finally the external resolver.

use crate::entity::{Entity, EntityResolver, ResolveContext, resolve_qualified};
use indexmap::IndexSet;

pub struct CompilationUnitScope<'a> {
    external: &'a dyn EntityResolver,
    package: Option<String>,
    single_imports: Vec<String>,
    on_demand_imports: Vec<String>,
    declared: IndexSet<String>,
}

impl<'a> CompilationUnitScope<'a> {
    pub fn new(external: &'a dyn EntityResolver) -> Self {
        Self {
            external,
            package: None,
            single_imports: Vec::new(),
            on_demand_imports: Vec::new(),
            declared: IndexSet::new(),
        }
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn set_package(&mut self, name: String) {
        if !name.is_empty() {
            self.package = Some(name);
        }
    }

    /// Records an import. Static imports take part in type lookup too, since
    /// they may name member types.
    pub fn add_import(&mut self, name: String, on_demand: bool) {
        if name.is_empty() {
            return;
        }
        if on_demand {
            self.on_demand_imports.push(name);
        } else {
            self.single_imports.push(name);
        }
    }

    /// Registers a type declared in this unit by its qualified name.
    pub fn declare(&mut self, qualified_name: String) {
        self.declared.insert(qualified_name);
    }

    pub fn declared_types(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }

    /// Qualified name of a top-level type called `name` in this unit's package.
    pub fn qualify(&self, name: &str) -> String {
        match &self.package {
            Some(package) => format!("{package}.{name}"),
            None => name.to_string(),
        }
    }

    fn class_in(&self, prefix: &str, name: &str, context: &ResolveContext) -> Option<Entity> {
        match resolve_qualified(self.external, &format!("{prefix}.{name}"), context) {
            Some(entity @ Entity::Class(_)) => Some(entity),
            _ => None,
        }
    }

    /// Whether `name` is a prefix package of this unit's own package.
    fn is_own_package_prefix(&self, name: &str) -> bool {
        self.package.as_deref().is_some_and(|package| {
            package == name
                || package
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

impl EntityResolver for CompilationUnitScope<'_> {
    fn resolve_package_or_class(&self, name: &str, context: &ResolveContext) -> Option<Entity> {
        for outer in context.enclosing_types.iter().rev() {
            let member = format!("{outer}.{name}");
            if self.declared.contains(&member) {
                return Some(Entity::Class(member));
            }
            if outer.rsplit('.').next() == Some(name) {
                return Some(Entity::Class(outer.clone()));
            }
        }

        let top_level = self.qualify(name);
        if self.declared.contains(&top_level) {
            return Some(Entity::Class(top_level));
        }

        if let Some(import) = self
            .single_imports
            .iter()
            .find(|import| import.rsplit('.').next() == Some(name))
        {
            return Some(Entity::Class(import.clone()));
        }

        if let Some(package) = &self.package {
            if let Some(entity) = self.class_in(package, name, context) {
                return Some(entity);
            }
        }

        for prefix in &self.on_demand_imports {
            if let Some(entity) = self.class_in(prefix, name, context) {
                return Some(entity);
            }
        }

        if let Some(entity) = self.class_in("java.lang", name, context) {
            return Some(entity);
        }

        if self.is_own_package_prefix(name) {
            return Some(Entity::Package(name.to_string()));
        }
        self.external.resolve_package_or_class(name, context)
    }

    fn sub_entity(&self, parent: &Entity, name: &str) -> Option<Entity> {
        let member = parent.member(name);
        if self.declared.contains(&member) {
            return Some(Entity::Class(member));
        }
        if let Some(found) = self.external.sub_entity(parent, name) {
            return Some(found);
        }
        match parent {
            Entity::Package(_) if self.is_own_package_prefix(&member) => {
                Some(Entity::Package(member))
            }
            _ => None,
        }
    }
}
