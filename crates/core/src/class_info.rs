//! Summary of the primary type of a compilation unit.

use crate::selection::Selection;
use crate::types::JavaType;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub keyword_selection: Selection,
    pub name_selection: Selection,
    pub semi_selection: Selection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    pub name: String,
    /// Erased signature, e.g. `java.lang.String format(java.lang.String, java.lang.Object[])`.
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<JavaType>,
    pub param_types: Vec<JavaType>,
    /// Parameter names separated by spaces.
    pub param_names: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javadoc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub public: bool,
    pub is_enum: bool,
    pub is_interface: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Where an `extends` clause would be inserted; cleared once one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends_insert_selection: Option<Selection>,
    /// From the end of the header before `extends` up to the superclass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends_replace_selection: Option<Selection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_replace_selection: Option<Selection>,
    pub implements: Vec<String>,
    /// The `implements` keyword followed by one span per interface; each
    /// span covers the comma separating it from the next.
    pub interface_selections: Vec<Selection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implements_insert_selection: Option<Selection>,
    pub used: BTreeSet<String>,
    /// Keyed by erased signature, in declaration order.
    pub methods: IndexMap<String, MethodInfo>,
}

impl ClassInfo {
    pub fn found_public_class(&self) -> bool {
        self.public
    }

    pub fn method(&self, signature: &str) -> Option<&MethodInfo> {
        self.methods.get(signature)
    }

    pub fn javadoc(&self, signature: &str) -> Option<&str> {
        self.methods.get(signature)?.javadoc.as_deref()
    }

    pub fn uses(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

/// Extracts the text of a `/** ... */` comment, without the delimiters and
/// the leading `*` of each line. Other comments yield `None`.
pub fn javadoc_text(comment: &str) -> Option<String> {
    let body = comment.strip_prefix("/**")?.strip_suffix("*/")?;
    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect();
    let first = lines.iter().position(|line| !line.is_empty())?;
    let last = lines.iter().rposition(|line| !line.is_empty())?;
    Some(lines[first..=last].join("\n"))
}
