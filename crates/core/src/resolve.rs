//! Resolution of type references given as token runs.
//!
//! Type argument nesting is tracked with a single depth counter shared by the
//! whole walk. A closing `>>` or `>>>` decrements it by two or three, so a
//! token that closes the current list may also close enclosing ones. Every
//! nested parse records the depth it started at and returns to its caller as
//! soon as the counter drops below that, without consuming a suffix.

use crate::entity::{Entity, EntityResolver, ResolveContext};
use crate::token::{LocatableToken, PrimitiveKind, TokenKind};
use crate::types::{
    ClassType, JavaType, TypeArgument, TypeResolution, TypeVariable, UnresolvedReason,
};

pub fn resolve_type(
    resolver: &dyn EntityResolver,
    context: &ResolveContext,
    tokens: &[LocatableToken],
) -> TypeResolution {
    if tokens.is_empty() {
        return TypeResolution::Unresolved(UnresolvedReason::EmptyTypeSpec);
    }
    let mut walker = TypeWalker {
        resolver,
        context,
        tokens,
        pos: 0,
        depth: 0,
    };
    match walker.parse_type() {
        Ok(_) if walker.depth != 0 => {
            TypeResolution::Unresolved(UnresolvedReason::UnbalancedTypeArguments)
        }
        Ok(ty) => match walker.peek() {
            Some(token) => {
                TypeResolution::Unresolved(UnresolvedReason::TrailingTokens(token.text.clone()))
            }
            None => TypeResolution::Resolved(ty),
        },
        Err(reason) => TypeResolution::Unresolved(reason),
    }
}

/// A name resolved so far: still possibly a package, or known to be a type.
enum Partial {
    Entity(Entity),
    Type(ClassType),
}

impl Partial {
    fn into_class(self) -> Result<ClassType, UnresolvedReason> {
        match self {
            Partial::Entity(entity) => entity
                .resolve_as_type()
                .ok_or_else(|| UnresolvedReason::NotAType(entity.name().to_string())),
            Partial::Type(class) => Ok(class),
        }
    }
}

struct TypeWalker<'a> {
    resolver: &'a dyn EntityResolver,
    context: &'a ResolveContext,
    tokens: &'a [LocatableToken],
    pos: usize,
    depth: i32,
}

impl<'a> TypeWalker<'a> {
    fn peek(&self) -> Option<&'a LocatableToken> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn bump(&mut self) -> Option<&'a LocatableToken> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn expect_identifier(&mut self) -> Result<&'a LocatableToken, UnresolvedReason> {
        match self.bump() {
            Some(token) if token.kind == TokenKind::Identifier => Ok(token),
            Some(token) => Err(UnresolvedReason::Malformed(format!(
                "expected a name, found `{}`",
                token.text
            ))),
            None => Err(UnresolvedReason::Malformed("type ends after `.`".to_string())),
        }
    }

    fn parse_type(&mut self) -> Result<JavaType, UnresolvedReason> {
        let entry_depth = self.depth;
        let token = self
            .bump()
            .ok_or_else(|| UnresolvedReason::Malformed("missing type".to_string()))?;

        if let TokenKind::Primitive(kind) = token.kind {
            let ty = self.array_suffix(JavaType::Primitive(kind))?;
            if kind == PrimitiveKind::Void && ty.dimensions() > 0 {
                return Err(UnresolvedReason::Malformed("array of void".to_string()));
            }
            return Ok(ty);
        }
        if token.kind != TokenKind::Identifier {
            return Err(UnresolvedReason::Malformed(format!(
                "unexpected `{}`",
                token.text
            )));
        }

        if self.peek_kind() != Some(TokenKind::Dot) {
            if let Some(var) = self.type_variable(&token.text)? {
                return self.array_suffix(var);
            }
        }

        let first = self
            .resolver
            .resolve_package_or_class(&token.text, self.context)
            .ok_or_else(|| UnresolvedReason::UnknownName(token.text.clone()))?;
        let mut current = Partial::Entity(first);

        loop {
            match self.peek_kind() {
                Some(TokenKind::Lt) => {
                    self.bump();
                    let mut class = current.into_class()?;
                    if !class.args.is_empty() {
                        return Err(UnresolvedReason::Malformed(format!(
                            "`{}` already has type arguments",
                            class.name
                        )));
                    }
                    class.args = self.type_arguments()?;
                    if self.depth < entry_depth {
                        // The closer also terminated enclosing argument lists.
                        return Ok(JavaType::Class(class));
                    }
                    current = Partial::Type(class);
                }
                Some(TokenKind::Dot) => {
                    self.bump();
                    let name = self.expect_identifier()?;
                    current = match current {
                        Partial::Entity(entity) => {
                            Partial::Entity(self.member(&entity, &name.text)?)
                        }
                        Partial::Type(outer) => {
                            let parent = Entity::Class(outer.name.clone());
                            let member = self.member(&parent, &name.text)?;
                            let mut class = member.resolve_as_type().ok_or_else(|| {
                                UnresolvedReason::NotAType(member.name().to_string())
                            })?;
                            class.outer = Some(Box::new(outer));
                            Partial::Type(class)
                        }
                    };
                }
                _ => break,
            }
        }

        let ty = JavaType::Class(current.into_class()?);
        self.array_suffix(ty)
    }

    fn member(&self, parent: &Entity, name: &str) -> Result<Entity, UnresolvedReason> {
        self.resolver
            .sub_entity(parent, name)
            .ok_or_else(|| UnresolvedReason::UnknownName(parent.member(name)))
    }

    /// Parses arguments after a consumed `<` up to and including the closer
    /// that brings the depth back to where it was.
    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>, UnresolvedReason> {
        let start = self.depth;
        self.depth += 1;
        let mut args = Vec::new();
        while self.depth > start {
            let arg = if self.peek_kind() == Some(TokenKind::Question) {
                self.bump();
                match self.peek_kind() {
                    Some(TokenKind::Extends) => {
                        self.bump();
                        TypeArgument::Extends(self.parse_type()?)
                    }
                    Some(TokenKind::Super) => {
                        self.bump();
                        TypeArgument::Super(self.parse_type()?)
                    }
                    _ => TypeArgument::Unbounded,
                }
            } else {
                TypeArgument::Type(self.parse_type()?)
            };
            args.push(arg);
            if self.depth <= start {
                break;
            }
            let token = self
                .bump()
                .ok_or(UnresolvedReason::UnbalancedTypeArguments)?;
            if token.kind == TokenKind::Comma {
                continue;
            }
            match token.kind.closing_depth() {
                Some(closed) => self.depth -= closed,
                None => {
                    return Err(UnresolvedReason::Malformed(format!(
                        "unexpected `{}` in type arguments",
                        token.text
                    )));
                }
            }
        }
        Ok(args)
    }

    fn array_suffix(&mut self, mut ty: JavaType) -> Result<JavaType, UnresolvedReason> {
        while self.peek_kind() == Some(TokenKind::LBracket) {
            self.bump();
            match self.bump() {
                Some(token) if token.kind == TokenKind::RBracket => ty = ty.array_of(),
                _ => return Err(UnresolvedReason::Malformed("unclosed `[`".to_string())),
            }
        }
        Ok(ty)
    }

    fn type_variable(&self, name: &str) -> Result<Option<JavaType>, UnresolvedReason> {
        let Some(index) = self.context.type_parameter(name) else {
            return Ok(None);
        };
        let param = &self.context.type_parameters[index];
        let erasure = if param.bound.is_empty() {
            JavaType::object()
        } else {
            let bound_context = self.context.without_bounds_from(index);
            match resolve_type(self.resolver, &bound_context, &param.bound) {
                TypeResolution::Resolved(bound) => bound.erasure(),
                TypeResolution::Unresolved(reason) => return Err(reason),
            }
        };
        Ok(Some(JavaType::TypeVariable(TypeVariable {
            name: name.to_string(),
            erasure: Box::new(erasure),
        })))
    }
}

/// Dotted name of the outermost type in `tokens`, with type arguments and
/// array brackets dropped: `java.util.Map<K, V>[]` gives `java.util.Map`.
pub fn class_name(tokens: &[LocatableToken]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut depth = 0i32;
    for token in tokens {
        match token.kind {
            TokenKind::Lt => depth += 1,
            TokenKind::LBracket if depth <= 0 => break,
            TokenKind::Identifier if depth <= 0 => parts.push(&token.text),
            kind => depth -= kind.closing_depth().unwrap_or(0),
        }
    }
    parts.join(".")
}

/// Every dotted class name mentioned in `tokens`, in order of appearance.
pub fn referenced_type_names(tokens: &[LocatableToken]) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Option<String> = None;
    let mut after_dot = false;
    for token in tokens {
        match token.kind {
            TokenKind::Identifier => match current.as_mut() {
                Some(name) if after_dot => {
                    name.push('.');
                    name.push_str(&token.text);
                }
                _ => {
                    names.extend(current.take());
                    current = Some(token.text.clone());
                }
            },
            TokenKind::Dot => {}
            _ => names.extend(current.take()),
        }
        after_dot = token.kind == TokenKind::Dot;
    }
    names.extend(current);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<LocatableToken> {
        let mut column = 1;
        source
            .split_whitespace()
            .map(|text| {
                let token = LocatableToken::new(text, 1, column);
                column += text.len() as u32 + 1;
                token
            })
            .collect()
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name(&tokens("java . util . Map < K , V > [ ]")), "java.util.Map");
        assert_eq!(class_name(&tokens("List < List < T >> [ ]")), "List");
        assert_eq!(class_name(&tokens("int [ ]")), "");
    }

    #[test]
    fn test_referenced_type_names() {
        let names = referenced_type_names(&tokens(
            "Map < String , java . util . List < ? extends Number >>",
        ));
        assert_eq!(names, vec!["Map", "String", "java.util.List", "Number"]);
        assert!(referenced_type_names(&tokens("int [ ]")).is_empty());
    }
}
