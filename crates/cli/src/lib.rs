mod check;
mod info;
mod tree;

use clap::{Args, Parser, Subcommand};
use jscope_core::editor::ParseOptions;
use jscope_core::logging::{LoggingOptions, default_log_dir, init_logging};
use jscope_java::ClassPath;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "jscope",
    version,
    about = "Structure trees and declaration summaries for Java sources",
    long_about = "jscope parses Java compilation units into a nested tree of structural nodes \
                  (types, members, statements, expressions and comments) and summarises the \
                  primary type of each unit: its package, supertypes, methods and the types \
                  it uses."
)]
pub struct Cli {
    #[command(flatten)]
    pub resolver: ResolverArgs,

    /// Also write logs to ~/.jscope/logs
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where type names are looked up, on top of the builtin JDK classes.
#[derive(Args, Debug, Default)]
pub struct ResolverArgs {
    /// JAR whose classes are visible to the sources (repeatable)
    #[arg(long = "classpath", value_name = "JAR", global = true)]
    pub classpath: Vec<PathBuf>,

    /// Source root whose .java files are visible to the sources (repeatable)
    #[arg(long = "sourcepath", value_name = "DIR", global = true)]
    pub sourcepath: Vec<PathBuf>,
}

impl ResolverArgs {
    pub fn build(&self) -> jscope_core::Result<ClassPath> {
        let mut classpath = ClassPath::with_builtins();
        for jar in &self.classpath {
            classpath.add_jar(jar)?;
        }
        for root in &self.sourcepath {
            classpath.add_source_root(root)?;
        }
        Ok(classpath)
    }
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct TreeArgs {
    /// Leave comments out of the tree
    #[arg(long)]
    pub no_comments: bool,

    /// Leave expression nodes out of the tree
    #[arg(long)]
    pub no_expressions: bool,
}

impl TreeArgs {
    pub fn options(self) -> ParseOptions {
        ParseOptions {
            attach_comments: !self.no_comments,
            expressions: !self.no_expressions,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the structure tree of a source file
    #[command(
        long_about = "Prints one line per node: its kind, its [start, end) byte span and, for \
                      declarations, its name. Children are indented below their parent."
    )]
    Tree {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        tree: TreeArgs,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarise the primary type of each source file
    Info {
        /// Source files, or directories searched for .java files
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Print the summaries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse every source file and verify the structure tree invariants
    #[command(
        long_about = "Parses each .java file in parallel and checks that every node lies within \
                      its parent and that siblings are ordered and disjoint. Exits with a failure \
                      status when any file cannot be read or yields an invalid tree."
    )]
    Check {
        /// Source files, or directories searched for .java files
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        tree: TreeArgs,
    },
}

pub fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Tree { .. } => "tree",
        Commands::Info { .. } => "info",
        Commands::Check { .. } => "check",
    };
    let logging = LoggingOptions {
        to_stderr: true,
        log_dir: cli.log_file.then(default_log_dir),
    };
    let _guard = init_logging(component, &logging);

    let classpath = cli.resolver.build()?;

    match cli.command {
        Commands::Tree {
            file,
            tree: args,
            json,
        } => tree::run(&file, &classpath, args.options(), json),
        Commands::Info { paths, json } => info::run(&paths, &classpath, json),
        Commands::Check { paths, tree: args } => check::run(&paths, &classpath, args.options()),
    }
}
