//! Resolved Java types.

use crate::token::PrimitiveKind;
use serde::Serialize;
use std::fmt;

pub const OBJECT: &str = "java.lang.Object";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JavaType {
    Primitive(PrimitiveKind),
    Array(Box<JavaType>),
    Class(ClassType),
    TypeVariable(TypeVariable),
}

/// A class or interface type. `outer` is set for member types reached through
/// a parameterized outer type, as in `Outer<String>.Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassType {
    pub name: String,
    pub args: Vec<TypeArgument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outer: Option<Box<ClassType>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeArgument {
    Type(JavaType),
    Extends(JavaType),
    Super(JavaType),
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeVariable {
    pub name: String,
    pub erasure: Box<JavaType>,
}

impl ClassType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            outer: None,
        }
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl JavaType {
    pub fn object() -> Self {
        JavaType::Class(ClassType::new(OBJECT))
    }

    pub fn class(name: impl Into<String>) -> Self {
        JavaType::Class(ClassType::new(name))
    }

    pub fn array_of(self) -> Self {
        JavaType::Array(Box::new(self))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveKind::Void))
    }

    pub fn dimensions(&self) -> usize {
        match self {
            JavaType::Array(component) => 1 + component.dimensions(),
            _ => 0,
        }
    }

    /// The type with all type arguments removed and type variables replaced
    /// by their erasure.
    pub fn erasure(&self) -> JavaType {
        match self {
            JavaType::Primitive(kind) => JavaType::Primitive(*kind),
            JavaType::Array(component) => component.erasure().array_of(),
            JavaType::Class(class) => JavaType::class(class.name.clone()),
            JavaType::TypeVariable(var) => var.erasure.erasure(),
        }
    }

    /// Renders the erasure: `java.util.List[]` for `List<String>[]`.
    pub fn erased(&self) -> Erased<'_> {
        Erased(self)
    }
}

pub struct Erased<'a>(&'a JavaType);

impl fmt::Display for Erased<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            JavaType::Primitive(kind) => write!(f, "{kind}"),
            JavaType::Array(component) => write!(f, "{}[]", component.erased()),
            JavaType::Class(class) => f.write_str(&class.name),
            JavaType::TypeVariable(var) => write!(f, "{}", var.erasure.erased()),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(kind) => write!(f, "{kind}"),
            JavaType::Array(component) => write!(f, "{component}[]"),
            JavaType::Class(class) => write!(f, "{class}"),
            JavaType::TypeVariable(var) => f.write_str(&var.name),
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outer {
            Some(outer) => write!(f, "{outer}.{}", self.simple_name())?,
            None => f.write_str(&self.name)?,
        }
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Type(ty) => write!(f, "{ty}"),
            TypeArgument::Extends(ty) => write!(f, "? extends {ty}"),
            TypeArgument::Super(ty) => write!(f, "? super {ty}"),
            TypeArgument::Unbounded => f.write_str("?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    EmptyTypeSpec,
    UnknownName(String),
    NotAType(String),
    Malformed(String),
    UnbalancedTypeArguments,
    TrailingTokens(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::EmptyTypeSpec => f.write_str("empty type"),
            UnresolvedReason::UnknownName(name) => write!(f, "cannot find `{name}`"),
            UnresolvedReason::NotAType(name) => write!(f, "`{name}` is not a type"),
            UnresolvedReason::Malformed(detail) => write!(f, "malformed type: {detail}"),
            UnresolvedReason::UnbalancedTypeArguments => {
                f.write_str("unbalanced type argument brackets")
            }
            UnresolvedReason::TrailingTokens(text) => write!(f, "unexpected `{text}` after type"),
        }
    }
}

/// Outcome of resolving a type reference. Failure is a value, never a guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeResolution {
    Resolved(JavaType),
    Unresolved(UnresolvedReason),
}

impl TypeResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TypeResolution::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&JavaType> {
        match self {
            TypeResolution::Resolved(ty) => Some(ty),
            TypeResolution::Unresolved(_) => None,
        }
    }

    pub fn into_resolved(self) -> Option<JavaType> {
        match self {
            TypeResolution::Resolved(ty) => Some(ty),
            TypeResolution::Unresolved(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(arg: TypeArgument) -> JavaType {
        JavaType::Class(ClassType {
            name: "java.util.List".to_string(),
            args: vec![arg],
            outer: None,
        })
    }

    #[test]
    fn test_erased_rendering() {
        let ty = list_of(TypeArgument::Extends(JavaType::class("java.lang.Number"))).array_of();
        assert_eq!(ty.erased().to_string(), "java.util.List[]");
        assert_eq!(ty.to_string(), "java.util.List<? extends java.lang.Number>[]");
        assert_eq!(ty.dimensions(), 1);
    }

    #[test]
    fn test_type_variable_erasure() {
        let var = JavaType::TypeVariable(TypeVariable {
            name: "T".to_string(),
            erasure: Box::new(JavaType::class("java.lang.Comparable")),
        });
        assert_eq!(var.to_string(), "T");
        assert_eq!(var.erased().to_string(), "java.lang.Comparable");
        assert_eq!(
            var.array_of().erasure(),
            JavaType::class("java.lang.Comparable").array_of()
        );
    }

    #[test]
    fn test_nested_through_parameterized_outer() {
        let outer = ClassType {
            name: "a.Outer".to_string(),
            args: vec![TypeArgument::Type(JavaType::class("java.lang.String"))],
            outer: None,
        };
        let inner = JavaType::Class(ClassType {
            name: "a.Outer.Inner".to_string(),
            args: Vec::new(),
            outer: Some(Box::new(outer)),
        });
        assert_eq!(inner.to_string(), "a.Outer<java.lang.String>.Inner");
        assert_eq!(inner.erased().to_string(), "a.Outer.Inner");
    }
}
