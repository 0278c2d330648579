//! An in-memory class path answering name lookups for the parsers.

use jscope_core::entity::{Entity, EntityResolver, ResolveContext};
use jscope_core::error::{JscopeError, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipArchive;

const BUILTIN_CLASSES: &[&str] = &[
    "java.lang.Object",
    "java.lang.String",
    "java.lang.StringBuilder",
    "java.lang.CharSequence",
    "java.lang.Class",
    "java.lang.Enum",
    "java.lang.Record",
    "java.lang.Boolean",
    "java.lang.Byte",
    "java.lang.Character",
    "java.lang.Short",
    "java.lang.Integer",
    "java.lang.Long",
    "java.lang.Float",
    "java.lang.Double",
    "java.lang.Number",
    "java.lang.Math",
    "java.lang.System",
    "java.lang.Thread",
    "java.lang.Runnable",
    "java.lang.Iterable",
    "java.lang.Comparable",
    "java.lang.Cloneable",
    "java.lang.AutoCloseable",
    "java.lang.Override",
    "java.lang.Deprecated",
    "java.lang.SuppressWarnings",
    "java.lang.FunctionalInterface",
    "java.lang.Throwable",
    "java.lang.Exception",
    "java.lang.Error",
    "java.lang.RuntimeException",
    "java.lang.IllegalArgumentException",
    "java.lang.IllegalStateException",
    "java.lang.NullPointerException",
    "java.lang.IndexOutOfBoundsException",
    "java.lang.UnsupportedOperationException",
    "java.lang.InterruptedException",
    "java.util.Collection",
    "java.util.List",
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.Set",
    "java.util.HashSet",
    "java.util.TreeSet",
    "java.util.Map",
    "java.util.Map.Entry",
    "java.util.HashMap",
    "java.util.TreeMap",
    "java.util.LinkedHashMap",
    "java.util.Iterator",
    "java.util.Comparator",
    "java.util.Optional",
    "java.util.Objects",
    "java.util.Arrays",
    "java.util.Collections",
    "java.util.Deque",
    "java.util.ArrayDeque",
    "java.util.Queue",
    "java.util.Random",
    "java.util.Scanner",
    "java.util.function.Function",
    "java.util.function.BiFunction",
    "java.util.function.Supplier",
    "java.util.function.Consumer",
    "java.util.function.Predicate",
    "java.util.stream.Stream",
    "java.util.stream.Collectors",
    "java.io.Serializable",
    "java.io.Closeable",
    "java.io.File",
    "java.io.InputStream",
    "java.io.OutputStream",
    "java.io.Reader",
    "java.io.Writer",
    "java.io.PrintStream",
    "java.io.IOException",
    "java.io.UncheckedIOException",
];

/// Known classes by canonical name, with every package that contains one.
#[derive(Debug, Clone, Default)]
pub struct ClassPath {
    classes: BTreeSet<String>,
    packages: BTreeSet<String>,
}

impl ClassPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// A class path holding the commonly used `java.lang`, `java.util` and
    /// `java.io` types.
    pub fn with_builtins() -> Self {
        let mut classpath = Self::new();
        for class in BUILTIN_CLASSES {
            classpath.add_class(class);
        }
        classpath
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    pub fn contains_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    /// Adds a class by canonical name. Leading lower-case segments are taken
    /// as the package, the rest as the class and its outer classes.
    pub fn add_class(&mut self, name: &str) {
        let segments: Vec<&str> = name.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return;
        }
        let split = segments
            .iter()
            .position(|segment| segment.starts_with(|c: char| c.is_uppercase()))
            .unwrap_or(segments.len() - 1);
        let (package, nested) = segments.split_at(split);
        self.add_class_in(&package.join("."), &nested.join("."));
    }

    /// Adds `nested` (a possibly dotted class name) to `package`, which may
    /// be empty for the default package.
    pub fn add_class_in(&mut self, package: &str, nested: &str) {
        let mut prefix = String::new();
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            self.packages.insert(prefix.clone());
        }
        for segment in nested.split('.').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            self.classes.insert(prefix.clone());
        }
    }

    /// Adds the classes of a JAR archive, returning how many entries were
    /// read. Anonymous and local classes are skipped.
    pub fn add_jar(&mut self, path: &Path) -> Result<usize> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file).map_err(|e| {
            JscopeError::ClassPath(format!("cannot read {}: {e}", path.display()))
        })?;
        let entries: Vec<(String, String)> =
            archive.file_names().filter_map(class_entry).collect();
        for (package, nested) in &entries {
            self.add_class_in(package, nested);
        }
        info!(jar = %path.display(), classes = entries.len(), "added jar to class path");
        Ok(entries.len())
    }

    /// Adds every `.java` file below `root` as a class named after the file,
    /// in the package given by its directory.
    pub fn add_source_root(&mut self, root: &Path) -> Result<usize> {
        let mut added = 0;
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "java") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.contains('-') {
                // package-info, module-info
                continue;
            }
            let package = path
                .parent()
                .and_then(|dir| dir.strip_prefix(root).ok())
                .map(|dir| {
                    dir.components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .unwrap_or_default();
            self.add_class_in(&package, stem);
            added += 1;
        }
        debug!(root = %root.display(), classes = added, "added source root to class path");
        Ok(added)
    }
}

/// Splits a JAR entry such as `java/util/Map$Entry.class` into its package
/// and dotted class name.
fn class_entry(entry: &str) -> Option<(String, String)> {
    let path = entry.strip_suffix(".class")?;
    if path.starts_with("META-INF/") {
        return None;
    }
    let (dir, file) = path.rsplit_once('/').unwrap_or(("", path));
    if file.contains('-') {
        return None;
    }
    let segments: Vec<&str> = file.split('$').collect();
    // Anonymous (`Outer$1`) and local (`Outer$1Local`) classes
    if segments
        .iter()
        .any(|s| s.is_empty() || s.starts_with(|c: char| c.is_ascii_digit()))
    {
        return None;
    }
    Some((dir.replace('/', "."), segments.join(".")))
}

impl EntityResolver for ClassPath {
    fn resolve_package_or_class(&self, name: &str, _context: &ResolveContext) -> Option<Entity> {
        if self.classes.contains(name) {
            Some(Entity::Class(name.to_string()))
        } else if self.packages.contains(name) {
            Some(Entity::Package(name.to_string()))
        } else {
            None
        }
    }

    fn sub_entity(&self, parent: &Entity, name: &str) -> Option<Entity> {
        let member = parent.member(name);
        if self.classes.contains(&member) {
            return Some(Entity::Class(member));
        }
        match parent {
            Entity::Package(_) if self.packages.contains(&member) => Some(Entity::Package(member)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_class_registers_packages_and_outer_classes() {
        let mut classpath = ClassPath::new();
        classpath.add_class("java.util.Map.Entry");
        assert!(classpath.contains_class("java.util.Map"));
        assert!(classpath.contains_class("java.util.Map.Entry"));
        assert!(classpath.contains_package("java"));
        assert!(classpath.contains_package("java.util"));
        assert!(!classpath.contains_package("java.util.Map"));
    }

    #[test]
    fn test_class_entry_names() {
        assert_eq!(
            class_entry("java/util/Map$Entry.class"),
            Some(("java.util".to_string(), "Map.Entry".to_string()))
        );
        assert_eq!(class_entry("Top.class"), Some((String::new(), "Top".to_string())));
        assert_eq!(class_entry("a/Outer$1.class"), None);
        assert_eq!(class_entry("a/Outer$1Local.class"), None);
        assert_eq!(class_entry("a/module-info.class"), None);
        assert_eq!(class_entry("META-INF/versions/9/a/B.class"), None);
        assert_eq!(class_entry("a/b/"), None);
    }

    #[test]
    fn test_sub_entity_of_class_is_never_a_package() {
        let mut classpath = ClassPath::new();
        classpath.add_class("a.B");
        classpath.add_class("a.B.C");
        let class = Entity::Class("a.B".to_string());
        assert_eq!(
            classpath.sub_entity(&class, "C"),
            Some(Entity::Class("a.B.C".to_string()))
        );
        assert_eq!(classpath.sub_entity(&class, "D"), None);
        assert_eq!(
            classpath.resolve_package_or_class("a", &ResolveContext::default()),
            Some(Entity::Package("a".to_string()))
        );
    }
}
