use jscope_core::class_info::ClassInfo;
use jscope_java::{ClassPath, java_files, parse_class_info_file};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::error;

#[derive(Tabled)]
struct MethodRow {
    #[tabled(rename = "Signature")]
    signature: String,
    #[tabled(rename = "Parameters")]
    params: String,
    #[tabled(rename = "Javadoc")]
    javadoc: String,
}

impl MethodRow {
    fn rows(info: &ClassInfo) -> Vec<MethodRow> {
        info.methods
            .values()
            .map(|method| MethodRow {
                signature: method.signature.clone(),
                params: method.param_names.clone(),
                // First line only
                javadoc: method
                    .javadoc
                    .as_deref()
                    .and_then(|doc| doc.lines().next())
                    .unwrap_or("-")
                    .to_string(),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct FileInfo<'a> {
    file: &'a Path,
    info: &'a ClassInfo,
}

pub fn run(
    paths: &[PathBuf],
    classpath: &ClassPath,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut summaries = Vec::new();
    let mut failed = 0;
    for path in paths {
        for file in java_files(path)? {
            match parse_class_info_file(&file, classpath) {
                Ok(info) => summaries.push((file, info)),
                Err(e) => {
                    error!(file = %file.display(), "{e}");
                    failed += 1;
                }
            }
        }
    }

    if json {
        let out: Vec<_> = summaries
            .iter()
            .map(|(file, info)| FileInfo { file, info })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (file, info) in &summaries {
            print_summary(file, info);
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(file: &Path, info: &ClassInfo) {
    println!("{}", file.display());
    let visibility = if info.public { "public " } else { "" };
    let kind = if info.is_interface {
        "interface"
    } else if info.is_enum {
        "enum"
    } else {
        "class"
    };
    println!("  Type:       {visibility}{kind} {}", info.name);
    if let Some(package) = &info.package {
        println!("  Package:    {}", package.name);
    }
    if let Some(superclass) = &info.superclass {
        println!("  Extends:    {superclass}");
    }
    if !info.implements.is_empty() {
        println!("  Implements: {}", info.implements.join(", "));
    }
    if !info.used.is_empty() {
        let used: Vec<_> = info.used.iter().map(String::as_str).collect();
        println!("  Uses:       {}", used.join(", "));
    }

    let rows = MethodRow::rows(info);
    if rows.is_empty() {
        println!("  No methods.");
    } else {
        println!("{}", Table::new(rows).with(Style::psql()));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use jscope_java::parse_class_info;

    #[test]
    fn test_method_rows() {
        let text = "class A {
    /**
     * First line.
     * Second line.
     */
    void f(int a, String b) {}
    A() {}
}
";
        let info = parse_class_info(text, &ClassPath::with_builtins()).unwrap();
        let rows = MethodRow::rows(&info);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].signature, "void f(int, java.lang.String)");
        assert_eq!(rows[0].params, "a b");
        assert_eq!(rows[0].javadoc, "First line.");
        assert_eq!(rows[1].javadoc, "-");
    }
}
