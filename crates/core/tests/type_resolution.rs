mod common;

use common::{MockResolver, type_tokens};
use jscope_core::entity::{Entity, EntityResolver, ResolveContext};
use jscope_core::event::TypeParam;
use jscope_core::resolve::resolve_type;
use jscope_core::scope::CompilationUnitScope;
use jscope_core::token::LocatableToken;
use jscope_core::types::{JavaType, TypeResolution, UnresolvedReason};

fn jdk_scope(resolver: &MockResolver) -> CompilationUnitScope<'_> {
    let mut scope = CompilationUnitScope::new(resolver);
    scope.add_import("java.util".to_string(), true);
    scope
}

fn resolve_in(
    scope: &CompilationUnitScope<'_>,
    context: &ResolveContext,
    source: &str,
) -> TypeResolution {
    resolve_type(scope, context, &type_tokens(source))
}

fn resolve(source: &str) -> TypeResolution {
    let resolver = MockResolver::jdk();
    let scope = jdk_scope(&resolver);
    resolve_in(&scope, &ResolveContext::default(), source)
}

fn resolved(resolution: TypeResolution) -> JavaType {
    match resolution {
        TypeResolution::Resolved(ty) => ty,
        TypeResolution::Unresolved(reason) => panic!("expected a type, got {reason}"),
    }
}

#[test]
fn test_nested_type_arguments() {
    let ty = resolved(resolve("Map < String , List < Integer > >"));
    assert_eq!(
        ty.to_string(),
        "java.util.Map<java.lang.String, java.util.List<java.lang.Integer>>"
    );
    assert_eq!(ty.erased().to_string(), "java.util.Map");
}

#[test]
fn test_shift_closes_two_lists() {
    let ty = resolved(resolve("Map < String , List < Integer >>"));
    assert_eq!(
        ty.to_string(),
        "java.util.Map<java.lang.String, java.util.List<java.lang.Integer>>"
    );

    let array = resolved(resolve("Map < String , List < Integer >> [ ]"));
    assert_eq!(array.dimensions(), 1);
    assert_eq!(array.erased().to_string(), "java.util.Map[]");
}

#[test]
fn test_unsigned_shift_closes_three_lists() {
    let ty = resolved(resolve("List < Set < List < String >>>"));
    assert_eq!(
        ty.to_string(),
        "java.util.List<java.util.Set<java.util.List<java.lang.String>>>"
    );
}

#[test]
fn test_shift_followed_by_more_arguments() {
    let ty = resolved(resolve("Map < List < Set < String >> , Integer >"));
    assert_eq!(
        ty.to_string(),
        "java.util.Map<java.util.List<java.util.Set<java.lang.String>>, java.lang.Integer>"
    );
}

#[test]
fn test_unbalanced_closers() {
    assert_eq!(
        resolve("List < String >>"),
        TypeResolution::Unresolved(UnresolvedReason::UnbalancedTypeArguments)
    );
    assert_eq!(
        resolve("List < String"),
        TypeResolution::Unresolved(UnresolvedReason::UnbalancedTypeArguments)
    );
}

#[test]
fn test_wildcards() {
    assert_eq!(
        resolved(resolve("List < ? extends Number >")).to_string(),
        "java.util.List<? extends java.lang.Number>"
    );
    assert_eq!(
        resolved(resolve("Comparator < ? super Integer >")).to_string(),
        "java.util.Comparator<? super java.lang.Integer>"
    );
    assert_eq!(resolved(resolve("List < ? >")).to_string(), "java.util.List<?>");
}

#[test]
fn test_fully_qualified_member_type() {
    let ty = resolved(resolve("java . util . Map . Entry < String , Integer >"));
    assert_eq!(
        ty.to_string(),
        "java.util.Map.Entry<java.lang.String, java.lang.Integer>"
    );
    assert_eq!(ty.erased().to_string(), "java.util.Map.Entry");
}

#[test]
fn test_member_of_parameterized_type() {
    let resolver = MockResolver::new(&["java.lang.String", "q.Outer", "q.Outer.Inner"]);
    let mut scope = CompilationUnitScope::new(&resolver);
    scope.set_package("q".to_string());
    let ty = resolved(resolve_in(
        &scope,
        &ResolveContext::default(),
        "Outer < String > . Inner",
    ));
    assert_eq!(ty.to_string(), "q.Outer<java.lang.String>.Inner");
    assert_eq!(ty.erased().to_string(), "q.Outer.Inner");
}

#[test]
fn test_type_variable_erases_to_first_bound() {
    let resolver = MockResolver::jdk();
    let scope = jdk_scope(&resolver);
    let mut param = TypeParam::new(LocatableToken::new("T", 1, 7));
    param.bound = type_tokens("Comparable < T >");
    let context = ResolveContext {
        enclosing_types: Vec::new(),
        type_parameters: vec![param],
    };

    let ty = resolved(resolve_in(&scope, &context, "T"));
    assert_eq!(ty.to_string(), "T");
    assert_eq!(ty.erased().to_string(), "java.lang.Comparable");

    let array = resolved(resolve_in(&scope, &context, "T [ ]"));
    assert_eq!(array.erased().to_string(), "java.lang.Comparable[]");
}

#[test]
fn test_unbounded_type_variable_erases_to_object() {
    let resolver = MockResolver::jdk();
    let scope = jdk_scope(&resolver);
    let context = ResolveContext {
        enclosing_types: Vec::new(),
        type_parameters: vec![TypeParam::new(LocatableToken::new("E", 1, 7))],
    };
    let ty = resolved(resolve_in(&scope, &context, "List < E >"));
    assert_eq!(ty.to_string(), "java.util.List<E>");
    let var = resolved(resolve_in(&scope, &context, "E"));
    assert_eq!(var.erased().to_string(), "java.lang.Object");
}

#[test]
fn test_primitive_arrays_and_malformed_types() {
    let ty = resolved(resolve("int [ ] [ ]"));
    assert_eq!(ty.dimensions(), 2);
    assert_eq!(ty.to_string(), "int[][]");

    assert!(matches!(
        resolve("void [ ]"),
        TypeResolution::Unresolved(UnresolvedReason::Malformed(_))
    ));
    assert!(matches!(
        resolve("String [ int"),
        TypeResolution::Unresolved(UnresolvedReason::Malformed(_))
    ));
    assert_eq!(
        resolve("String String"),
        TypeResolution::Unresolved(UnresolvedReason::TrailingTokens("String".to_string()))
    );
    assert_eq!(
        resolve_type(&MockResolver::jdk(), &ResolveContext::default(), &[]),
        TypeResolution::Unresolved(UnresolvedReason::EmptyTypeSpec)
    );
}

#[test]
fn test_unknown_names_and_packages() {
    assert_eq!(
        resolve("Nope"),
        TypeResolution::Unresolved(UnresolvedReason::UnknownName("Nope".to_string()))
    );
    assert_eq!(
        resolve("java . util"),
        TypeResolution::Unresolved(UnresolvedReason::NotAType("java.util".to_string()))
    );
    assert_eq!(
        resolve("java . util . Nope"),
        TypeResolution::Unresolved(UnresolvedReason::UnknownName("java.util.Nope".to_string()))
    );
}

#[test]
fn test_enclosing_member_types_shadow_imports() {
    let resolver = MockResolver::jdk();
    let mut scope = CompilationUnitScope::new(&resolver);
    scope.set_package("p".to_string());
    scope.add_import("java.util.List".to_string(), false);
    scope.declare("p.A".to_string());
    scope.declare("p.A.List".to_string());
    let context = ResolveContext {
        enclosing_types: vec!["p.A".to_string()],
        type_parameters: Vec::new(),
    };
    assert_eq!(
        scope.resolve_package_or_class("List", &context),
        Some(Entity::Class("p.A.List".to_string()))
    );
    assert_eq!(
        scope.resolve_package_or_class("A", &context),
        Some(Entity::Class("p.A".to_string()))
    );
    // outside the class the import applies
    assert_eq!(
        scope.resolve_package_or_class("List", &ResolveContext::default()),
        Some(Entity::Class("java.util.List".to_string()))
    );
}

#[test]
fn test_import_package_and_on_demand_precedence() {
    let resolver = MockResolver::new(&[
        "java.lang.String",
        "java.util.Map",
        "java.util.Set",
        "p.Map",
        "other.Map",
        "other.Set",
    ]);
    let context = ResolveContext::default();

    let mut scope = CompilationUnitScope::new(&resolver);
    scope.set_package("p".to_string());
    scope.add_import("java.util".to_string(), true);
    // the package comes before on-demand imports
    assert_eq!(
        scope.resolve_package_or_class("Map", &context),
        Some(Entity::Class("p.Map".to_string()))
    );

    scope.add_import("other.Map".to_string(), false);
    assert_eq!(
        scope.resolve_package_or_class("Map", &context),
        Some(Entity::Class("other.Map".to_string()))
    );

    // on-demand imports are searched in order
    scope.add_import("other".to_string(), true);
    assert_eq!(
        scope.resolve_package_or_class("Set", &context),
        Some(Entity::Class("java.util.Set".to_string()))
    );
    assert_eq!(
        scope.resolve_package_or_class("String", &context),
        Some(Entity::Class("java.lang.String".to_string()))
    );
}

#[test]
fn test_qualified_reference_to_type_in_this_unit() {
    let resolver = MockResolver::jdk();
    let mut scope = CompilationUnitScope::new(&resolver);
    scope.set_package("p.q".to_string());
    scope.declare("p.q.Local".to_string());
    let ty = resolved(resolve_in(&scope, &ResolveContext::default(), "p . q . Local"));
    assert_eq!(ty.to_string(), "p.q.Local");
    assert_eq!(
        scope.resolve_package_or_class("p", &ResolveContext::default()),
        Some(Entity::Package("p".to_string()))
    );
}
