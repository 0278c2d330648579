pub mod classpath;
pub mod grammar;

pub use classpath::ClassPath;
pub use grammar::JavaGrammar;

use jscope_core::class_info::ClassInfo;
use jscope_core::editor::{EditorParser, ParseOptions};
use jscope_core::entity::EntityResolver;
use jscope_core::error::Result;
use jscope_core::info::InfoParser;
use jscope_core::tree::SourceTree;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Builds the structural tree of one compilation unit.
pub fn parse_structure(
    text: &str,
    resolver: &dyn EntityResolver,
    options: ParseOptions,
) -> Result<SourceTree> {
    EditorParser::new(text, resolver, options).parse_compilation_unit(&JavaGrammar::new())
}

/// Summarises the primary type of one compilation unit.
pub fn parse_class_info(text: &str, resolver: &dyn EntityResolver) -> Result<ClassInfo> {
    InfoParser::parse(&JavaGrammar::new(), text, resolver)
}

/// Reads a source file. Invalid UTF-8 is replaced rather than rejected.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(path = %path.display(), "source is not valid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

pub fn parse_class_info_file(path: &Path, resolver: &dyn EntityResolver) -> Result<ClassInfo> {
    let text = read_source(path)?;
    debug!(path = %path.display(), bytes = text.len(), "parsing class info");
    parse_class_info(&text, resolver)
}

/// The `.java` files below `root`, sorted. A file is returned as is.
pub fn java_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "java")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
