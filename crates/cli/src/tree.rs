use jscope_core::editor::ParseOptions;
use jscope_java::{ClassPath, parse_structure, read_source};
use std::path::Path;
use std::process::ExitCode;
use tracing::warn;

pub fn run(
    file: &Path,
    classpath: &ClassPath,
    options: ParseOptions,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let text = read_source(file)?;
    let tree = parse_structure(&text, classpath, options)?;

    for message in tree.syntax_errors() {
        warn!(file = %file.display(), "{message}");
    }

    if json {
        let summary = tree.summary(tree.root());
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{tree}");
    }
    Ok(ExitCode::SUCCESS)
}
