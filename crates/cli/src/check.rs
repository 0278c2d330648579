use jscope_core::editor::ParseOptions;
use jscope_java::{ClassPath, java_files, parse_structure, read_source};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Debug)]
struct FileReport {
    nodes: usize,
    syntax_errors: usize,
}

fn check_file(
    file: &Path,
    classpath: &ClassPath,
    options: ParseOptions,
) -> jscope_core::Result<FileReport> {
    let text = read_source(file)?;
    let tree = parse_structure(&text, classpath, options)?;
    tree.validate()?;
    Ok(FileReport {
        nodes: tree.len(),
        syntax_errors: tree.syntax_errors().len(),
    })
}

pub fn run(
    paths: &[PathBuf],
    classpath: &ClassPath,
    options: ParseOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let failed = check_all(paths, classpath, options)?;
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Checks every file below `paths`, returning how many failed.
fn check_all(
    paths: &[PathBuf],
    classpath: &ClassPath,
    options: ParseOptions,
) -> jscope_core::Result<usize> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(java_files(path)?);
    }

    let reports: Vec<_> = files
        .par_iter()
        .map(|file| (file, check_file(file, classpath, options)))
        .collect();

    let mut failed = 0;
    let mut nodes = 0;
    for (file, report) in &reports {
        match report {
            Ok(report) => {
                nodes += report.nodes;
                if report.syntax_errors > 0 {
                    warn!(
                        file = %file.display(),
                        count = report.syntax_errors,
                        "syntax errors"
                    );
                }
            }
            Err(e) => {
                failed += 1;
                println!("FAIL {}: {e}", file.display());
            }
        }
    }

    info!(files = reports.len(), nodes, failed, "check complete");
    println!("checked {} files, {} failed", reports.len(), failed);
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_file_counts_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("Good.java");
        std::fs::write(&good, "class Good {\n    void f() { int x = 1; }\n}\n").unwrap();
        let report =
            check_file(&good, &ClassPath::with_builtins(), ParseOptions::default()).unwrap();
        assert!(report.nodes > 1);
        assert_eq!(report.syntax_errors, 0);

        let missing = dir.path().join("Missing.java");
        assert!(check_file(&missing, &ClassPath::new(), ParseOptions::default()).is_err());
    }

    #[test]
    fn test_run_over_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.java"), "class A {}\n").unwrap();
        std::fs::write(dir.path().join("B.java"), "interface B { void b(); }\n").unwrap();
        let failed = check_all(
            &[dir.path().to_path_buf()],
            &ClassPath::with_builtins(),
            ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(failed, 0);

        let missing = dir.path().join("gone");
        assert!(check_all(&[missing], &ClassPath::new(), ParseOptions::default()).is_err());
    }
}
